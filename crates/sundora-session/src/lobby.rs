//! Creating and joining sessions.

use sundora_api_client::SessionBackend;
use sundora_core::{SessionCode, ShareResult, UserAction};

/// Ask the backend for a fresh session.
pub async fn create_session(backend: &dyn SessionBackend) -> ShareResult<SessionCode> {
    backend.create_session().await.inspect_err(|err| {
        err.log(UserAction::CreateSession);
    })
}

/// Validate a code typed by a joining user. No network call is made.
pub fn join_session(input: &str) -> ShareResult<SessionCode> {
    SessionCode::parse(input).inspect_err(|err| err.log(UserAction::JoinSession))
}
