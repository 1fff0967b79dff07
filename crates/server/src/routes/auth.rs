//! Authentication route handlers.
//!
//! Accounts live in `users.json`. Passwords are compared verbatim; the file
//! format predates any hashing and existing accounts must keep working.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::forms::RegistrationForm;

use super::{Page, redirect_with};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, clear_current_user, push_flash, set_current_user};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;
use crate::store::UserRepository;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub username: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: Page,
    pub form: RegistrationForm,
}

/// Send visitors to the page their role starts on.
pub async fn index(OptionalUser(user): OptionalUser) -> Redirect {
    Redirect::to(user.as_ref().map_or("/login", CurrentUser::landing_page))
}

/// Display the login page.
pub async fn login_page(session: Session, OptionalUser(user): OptionalUser) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.landing_page()).into_response();
    }
    LoginTemplate {
        page: Page::new(&session, None).await,
        username: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let username = form.username.trim();
    let account = UserRepository::new(state.store())
        .get_by_username(username)
        .await?
        .filter(|u| u.password_matches(&form.password));

    let Some(account) = account else {
        tracing::warn!(%username, "Login failed");
        let page = Page::new(&session, None)
            .await
            .with_errors(&["Invalid username or password.".to_string()]);
        return Ok(LoginTemplate {
            page,
            username: username.to_owned(),
        }
        .into_response());
    };

    let current = CurrentUser::from(&account);
    log_in(&session, &current).await?;
    tracing::info!(username = %current.username, "User logged in");

    Ok(redirect_with(
        &session,
        Flash::success(format!("Welcome, {}!", current.display_name)),
        current.landing_page(),
    )
    .await)
}

/// Display the registration page.
pub async fn register_page(session: Session, OptionalUser(user): OptionalUser) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.landing_page()).into_response();
    }
    RegisterTemplate {
        page: Page::new(&session, None).await,
        form: RegistrationForm::default(),
    }
    .into_response()
}

/// Handle registration form submission. A new account is logged in at once.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Result<Response> {
    let store = state.store();
    let account = {
        let _guard = store.write_lock().await;
        let users = UserRepository::new(store);
        match form.validate(&users.get_all().await?) {
            Ok(account) => {
                users.create(account.clone()).await?;
                account
            }
            Err(errors) => {
                tracing::warn!(username = %form.username.trim(), ?errors, "Registration rejected");
                let page = Page::new(&session, None).await.with_errors(&errors);
                let form = RegistrationForm {
                    password: String::new(),
                    ..form
                };
                return Ok(RegisterTemplate { page, form }.into_response());
            }
        }
    };

    let current = CurrentUser::from(&account);
    log_in(&session, &current).await?;
    tracing::info!(username = %current.username, "User registered");

    Ok(redirect_with(
        &session,
        Flash::success(format!("Account created. Welcome, {}!", current.display_name)),
        current.landing_page(),
    )
    .await)
}

/// Log out and return to the login page.
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_flash(&session, Flash::info("You have been logged out.")).await?;
    Ok(Redirect::to("/login").into_response())
}

async fn log_in(session: &Session, user: &CurrentUser) -> Result<()> {
    set_current_user(session, user).await?;
    set_sentry_user(&user.username, Some(&user.email));
    Ok(())
}
