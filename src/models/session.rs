use serde::{Deserialize, Serialize};

/// Key under which the per-session UI state lives in the cookie session.
pub const SESSION_KEY: &str = "ui_state";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Login,
    Signup,
    Upload,
}

/// User actions that drive the login -> signup -> upload flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoginSucceeded,
    SignupRequested,
    SignupSucceeded,
    BackToLogin,
    Logout,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub logged_in: bool,
    pub page: Page,
}

impl SessionState {
    /// Applies `event` if it is valid from the current page.
    /// Returns false and leaves the state untouched otherwise.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        let next = match (self.page, event) {
            (Page::Login, SessionEvent::LoginSucceeded) => SessionState {
                logged_in: true,
                page: Page::Upload,
            },
            (Page::Login, SessionEvent::SignupRequested) => SessionState {
                page: Page::Signup,
                ..*self
            },
            (Page::Signup, SessionEvent::SignupSucceeded)
            | (Page::Signup, SessionEvent::BackToLogin) => SessionState {
                page: Page::Login,
                ..*self
            },
            (Page::Upload, SessionEvent::Logout) => SessionState::default(),
            _ => return false,
        };

        *self = next;
        true
    }

    /// The view that should be rendered. Upload is only reachable when logged in.
    pub fn view(&self) -> Page {
        match self.page {
            Page::Upload if !self.logged_in => Page::Login,
            page => page,
        }
    }

    pub fn can_predict(&self) -> bool {
        self.logged_in && self.page == Page::Upload
    }
}
