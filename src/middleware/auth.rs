use axum::{
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    extract::Request,
    body::Body,
};
use tower_sessions::Session;
use crate::errors::AppResult;
use crate::models::{SessionState, SESSION_KEY};

/// Current UI state for this session, defaults when the session is new.
pub async fn session_state(session: &Session) -> AppResult<SessionState> {
    Ok(session.get::<SessionState>(SESSION_KEY).await?.unwrap_or_default())
}

pub async fn store_session_state(session: &Session, state: SessionState) -> AppResult<()> {
    session.insert(SESSION_KEY, state).await?;
    Ok(())
}

/// Prediction routes are only open to logged-in sessions on the upload page.
pub async fn require_upload_access(
    session: Session,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if !path.starts_with("/predict") {
        return next.run(req).await;
    }

    match session.get::<SessionState>(SESSION_KEY).await {
        Ok(Some(state)) if state.can_predict() => next.run(req).await,
        Ok(_) => {
            tracing::warn!("Unauthenticated request to {}", path);
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            Redirect::to("/").into_response()
        }
    }
}
