//! Login, registration and page gates.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::payload::Envelope;
use crate::api::{json_body, ApiError, Method};
use crate::form::validation::{validate_email, validate_required, ValidationError};
use crate::models::UserProfile;
use crate::session::Session;
use crate::ui::{Route, SingleFlight};
use crate::AppState;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    SignedIn,
    /// A session already existed; no request was made
    AlreadySignedIn,
    Registered,
    Invalid(ValidationError),
    Failed(String),
    Busy,
}

/// Drives the login and register pages.
pub struct AuthController {
    app: Arc<AppState>,
    in_flight: SingleFlight,
}

impl AuthController {
    pub fn new(app: Arc<AppState>) -> Self {
        Self {
            app,
            in_flight: SingleFlight::new(),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthOutcome {
        if self.app.session.is_authenticated() {
            self.app.navigator.redirect(Route::Suppliers);
            return AuthOutcome::AlreadySignedIn;
        }
        let Some(_flight) = self.in_flight.try_begin("login") else {
            return AuthOutcome::Busy;
        };

        let request = match login_request(username, password) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Login form rejected");
                return AuthOutcome::Invalid(e);
            }
        };

        let result = {
            let _loading = self.app.loading.show();
            self.send_login(&request).await
        };

        match result {
            Ok((token, user)) => {
                if let Err(e) = self.app.session.set_session(&token, &user) {
                    warn!(error = %e, "Failed to persist session");
                    let message = format!("Could not save session: {}", e);
                    self.app.notifier.error(&message);
                    return AuthOutcome::Failed(message);
                }
                info!(username = %user.username, role = %user.role, "Signed in");
                self.app.navigator.redirect(Route::Suppliers);
                AuthOutcome::SignedIn
            }
            Err(e) => {
                let message = e.user_message("Login failed");
                warn!(username = %request.username, error = %e, "Login failed");
                self.app.notifier.error(&message);
                AuthOutcome::Failed(message)
            }
        }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> AuthOutcome {
        let Some(_flight) = self.in_flight.try_begin("register") else {
            return AuthOutcome::Busy;
        };

        let request = match register_request(username, email, password) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Registration form rejected");
                return AuthOutcome::Invalid(e);
            }
        };

        let result = {
            let _loading = self.app.loading.show();
            self.send_register(&request).await
        };

        match result {
            Ok(()) => {
                info!(username = %request.username, "Registered");
                self.app
                    .notifier
                    .success("Registered successfully. You can now log in.");
                self.app.navigator.redirect(Route::Login);
                AuthOutcome::Registered
            }
            Err(e) => {
                let message = e.user_message("Registration failed");
                warn!(username = %request.username, error = %e, "Registration failed");
                self.app.notifier.error(&message);
                AuthOutcome::Failed(message)
            }
        }
    }

    async fn send_login(&self, request: &LoginRequest) -> Result<(String, UserProfile), ApiError> {
        let envelope: Envelope<serde_json::Value> = self
            .app
            .api
            .call_public(LOGIN_PATH, Method::Post, Some(json_body(request)?))
            .await?
            .envelope("Invalid credentials")?;

        match (envelope.token, envelope.user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok((token, user)),
            _ => Err(ApiError::MalformedPayload(
                "login response did not include a token and user".to_string(),
            )),
        }
    }

    async fn send_register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.app
            .api
            .call_public(REGISTER_PATH, Method::Post, Some(json_body(request)?))
            .await?
            .envelope::<serde_json::Value>("Registration failed")
            .map(|_| ())
    }
}

fn login_request(username: &str, password: &str) -> Result<LoginRequest, ValidationError> {
    let username = validate_required(username, ValidationError::UsernameRequired)?;
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    Ok(LoginRequest {
        username,
        password: password.to_string(),
    })
}

fn register_request(
    username: &str,
    email: &str,
    password: &str,
) -> Result<RegisterRequest, ValidationError> {
    let username = validate_required(username, ValidationError::UsernameRequired)?;
    let email = validate_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    Ok(RegisterRequest {
        username,
        email,
        password: password.to_string(),
    })
}

/// Clear the session and go back to the login page.
pub fn logout(app: &AppState) {
    app.session.clear();
    app.navigator.redirect(Route::Login);
    info!("Signed out");
}

/// Gate for pages that need a signed-in user.
pub fn require_session(app: &AppState) -> Option<Session> {
    match app.session.get_session() {
        Some(session) => Some(session),
        None => {
            debug!("No session, redirecting to login");
            app.navigator.redirect(Route::Login);
            None
        }
    }
}

/// Gate for the users page. Non-admins are sent to the suppliers page.
pub fn require_admin(app: &AppState) -> Option<Session> {
    let session = require_session(app)?;
    if session.user.is_admin() {
        Some(session)
    } else {
        warn!(username = %session.user.username, "Users page requires admin role");
        app.navigator.redirect(Route::Suppliers);
        None
    }
}

/// Navigation entries shown to `session`.
pub fn nav_links(session: &Session) -> Vec<Route> {
    if session.user.is_admin() {
        vec![Route::Suppliers, Route::Users]
    } else {
        vec![Route::Suppliers]
    }
}
