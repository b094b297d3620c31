mod auth;

pub use auth::{require_upload_access, session_state, store_session_state};
