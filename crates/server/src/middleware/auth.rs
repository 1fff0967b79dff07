//! Authentication and role extractors.
//!
//! Every page except login, registration and health needs a logged-in user.
//! Sales, inventory and exports are for the admin; the shop and cart are for
//! everyone else. Rejections redirect with a flash message instead of
//! returning a bare status code.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::middleware::flash::push_flash;
use crate::models::{CurrentUser, Flash, session_keys};

/// Extractor that requires the admin.
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(user): RequireAdmin) -> String {
///     format!("Hello, {}!", user.display_name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

/// Extractor that requires a logged-in user who is not the admin.
pub struct RequireCustomer(pub CurrentUser);

/// Extractor that optionally gets the current user.
pub struct OptionalUser(pub Option<CurrentUser>);

/// Why a guarded route turned the request away.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in.
    RedirectToLogin,
    /// Logged in, but this page belongs to the other role.
    RedirectTo(&'static str),
    /// The session layer is not installed.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectTo(path) => Redirect::to(path).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn current_user(parts: &Parts) -> Result<(Session, Option<CurrentUser>), AuthRejection> {
    // Set by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AuthRejection::MissingSession)?;

    let user = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();
    Ok((session, user))
}

/// Flash and build the rejection. A failed flash write still redirects.
async fn reject(session: &Session, flash: Flash, rejection: AuthRejection) -> AuthRejection {
    if let Err(e) = push_flash(session, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
    rejection
}

async fn require_login(parts: &Parts) -> Result<(Session, CurrentUser), AuthRejection> {
    match current_user(parts).await? {
        (session, Some(user)) => Ok((session, user)),
        (session, None) => {
            tracing::debug!(path = %parts.uri.path(), "Unauthenticated request redirected to login");
            Err(reject(
                &session,
                Flash::error("Please log in to continue."),
                AuthRejection::RedirectToLogin,
            )
            .await)
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (session, user) = require_login(parts).await?;
        if user.is_admin() {
            return Ok(Self(user));
        }

        tracing::warn!(username = %user.username, path = %parts.uri.path(), "Non-admin denied");
        Err(reject(
            &session,
            Flash::error("Only the administrator can access that page."),
            AuthRejection::RedirectTo(user.landing_page()),
        )
        .await)
    }
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (session, user) = require_login(parts).await?;
        if !user.is_admin() {
            return Ok(Self(user));
        }

        Err(reject(
            &session,
            Flash::info("The shop is for customer accounts."),
            AuthRejection::RedirectTo(user.landing_page()),
        )
        .await)
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (_, user) = current_user(parts).await?;
        Ok(Self(user))
    }
}

/// Store the logged-in user in the session.
///
/// The session ID is cycled first so a pre-login ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Forget the logged-in user and any pending state (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
