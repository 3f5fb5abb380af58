//! Session route handlers.
//!
//! The browser signs in with the identity provider directly and exchanges
//! the access token here for a server session. From then on the session
//! cookie identifies the user to the cart and checkout routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::ApiJson;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::gateway::Gateway;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Body of `POST /api/auth/session`.
#[derive(Deserialize)]
pub struct SignInRequest {
    pub access_token: String,
}

/// Exchange an identity provider access token for a session.
#[instrument(skip_all)]
pub async fn sign_in<G: Gateway>(
    State(state): State<AppState<G>>,
    session: Session,
    ApiJson(body): ApiJson<SignInRequest>,
) -> Result<Json<CurrentUser>> {
    let identity = state.identity().verify_access_token(&body.access_token).await?;
    let user = CurrentUser {
        id: identity.id,
        email: identity.email,
    };

    // Fresh session id on sign-in (session fixation).
    session.cycle_id().await?;
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, user.email.as_deref());

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(Json(user))
}

/// The signed-in user.
pub async fn current(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}

/// End the session.
#[instrument(skip_all)]
pub async fn sign_out(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
