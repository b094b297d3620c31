mod user;
mod forms;
mod session;
mod prediction;

pub use user::{Credentials, User, MAX_PASSWORD_BYTES};
pub use forms::{LoginForm, SignupForm};
pub use session::{Page, SessionEvent, SessionState, SESSION_KEY};
pub use prediction::{PredictionRow, PredictionTable, COLUMN_NAMES};
