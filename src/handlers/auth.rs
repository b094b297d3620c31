use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use crate::errors::{AppError, AppResult};
use crate::middleware::{session_state, store_session_state};
use crate::models::{LoginForm, Page, SessionEvent, SignupForm, MAX_PASSWORD_BYTES};
use crate::AppState;
use super::views::{self, Notice, UploadOutcome};

/// Renders whichever view the session is currently on.
pub async fn serve_index(
    State(state): State<AppState>,
    session: Session,
    Query(notice): Query<Notice>,
) -> AppResult<Response> {
    let ui = session_state(&session).await?;
    let templates = &state.config.ui.templates_dir;

    let html = match ui.view() {
        Page::Login => views::render_login(templates, &notice)?,
        Page::Signup => views::render_signup(templates, &notice)?,
        Page::Upload => views::render_upload(templates, &notice, UploadOutcome::Idle)?,
    };
    Ok(html.into_response())
}

// bcrypt is CPU bound, keep it off the async workers
async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::TaskPanic(e.to_string()))?
}

pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(login_form): Form<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Login attempt for user: {}", login_form.username);

    let store = state.credentials.clone();
    let username = login_form.username.clone();
    let verified = blocking(move || {
        Ok(store.login(&login_form.username, &login_form.password)?)
    })
    .await?;

    if !verified {
        tracing::info!("Login failed for user: {}", username);
        return Err(AppError::Auth("Incorrect username or password.".into()));
    }

    if !transition(&session, SessionEvent::LoginSucceeded).await? {
        // Credentials were fine but the session is not on the login view
        return Ok(Redirect::to("/").into_response());
    }
    tracing::info!("User logged in: {}", username);
    Ok(Redirect::to("/?success=Logged%20in%20successfully!").into_response())
}

/// "Create New Account" on the login view.
pub async fn open_signup(session: Session) -> AppResult<Response> {
    transition(&session, SessionEvent::SignupRequested).await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn handle_signup(
    State(state): State<AppState>,
    session: Session,
    Form(signup_form): Form<SignupForm>,
) -> AppResult<Response> {
    if signup_form.username.trim().is_empty() || signup_form.password.is_empty() {
        return Err(AppError::Auth("Username and password are required.".into()));
    }
    if signup_form.password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Auth(format!(
            "Password must be at most {} bytes.",
            MAX_PASSWORD_BYTES
        )));
    }

    let store = state.credentials.clone();
    let created = blocking(move || {
        Ok(store.signup(&signup_form.username, &signup_form.password)?)
    })
    .await?;

    if !created {
        return Err(AppError::Auth("Username already exists. Try another one.".into()));
    }

    transition(&session, SessionEvent::SignupSucceeded).await?;
    Ok(Redirect::to("/?success=Account%20created%20successfully!").into_response())
}

/// "Back to Login" on the signup view.
pub async fn back_to_login(session: Session) -> AppResult<Response> {
    transition(&session, SessionEvent::BackToLogin).await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn handle_logout(session: Session) -> AppResult<Response> {
    if transition(&session, SessionEvent::Logout).await? {
        tracing::info!("Session logged out");
    }
    Ok(Redirect::to("/").into_response())
}

async fn transition(session: &Session, event: SessionEvent) -> AppResult<bool> {
    let mut ui = session_state(session).await?;
    let applied = ui.apply(event);
    if applied {
        store_session_state(session, ui).await?;
    } else {
        tracing::debug!("Ignoring {:?} from {:?}", event, ui.page);
    }
    Ok(applied)
}
