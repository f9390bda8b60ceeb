use std::sync::Arc;
use tracing::{debug, info, warn};

use super::validation::{validate_email, validate_required, ValidationError};
use super::{
    delete_entity, report_failure, resync, send_mutation, DeleteOutcome, FormSurface, SaveOutcome,
};
use crate::api::payload::Envelope;
use crate::api::{json_body, ApiError, Method};
use crate::auth::RegisterRequest;
use crate::list::ListController;
use crate::models::{Entity, ManagedUser, Role, UserPayload};
use crate::ui::SingleFlight;
use crate::AppState;

/// Raw input of the user dialog on the admin page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub id: Option<String>,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    /// Required on create; on edit an empty value keeps the current password
    pub password: String,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            id: None,
            username: String::new(),
            email: String::new(),
            role: Role::User,
            active: true,
            password: String::new(),
        }
    }
}

/// What a valid form turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSubmission {
    /// Register the account, then apply role and status to it
    Create {
        register: RegisterRequest,
        role: Role,
        active: bool,
    },
    Update { id: String, payload: UserPayload },
}

impl UserForm {
    pub fn for_edit(user: &ManagedUser) -> Self {
        Self {
            id: Some(user.id.clone()),
            username: user.username.clone().unwrap_or_default(),
            email: user.email.clone().unwrap_or_default(),
            role: user.role.unwrap_or_default(),
            active: user.active.unwrap_or(true),
            password: String::new(),
        }
    }

    pub fn validate(&self) -> Result<UserSubmission, ValidationError> {
        let username = validate_required(&self.username, ValidationError::UsernameRequired)?;
        let email = validate_email(&self.email)?;

        match &self.id {
            Some(id) => Ok(UserSubmission::Update {
                id: id.clone(),
                payload: UserPayload {
                    username: Some(username),
                    email: Some(email),
                    role: Some(self.role),
                    active: Some(self.active),
                    password: Some(self.password.clone()).filter(|p| !p.is_empty()),
                },
            }),
            None => {
                if self.password.is_empty() {
                    return Err(ValidationError::PasswordRequired);
                }
                Ok(UserSubmission::Create {
                    register: RegisterRequest {
                        username,
                        email,
                        password: self.password.clone(),
                    },
                    role: self.role,
                    active: self.active,
                })
            }
        }
    }
}

pub struct UserFormController {
    app: Arc<AppState>,
    list: Arc<ListController<ManagedUser>>,
    surface: FormSurface<UserForm>,
    in_flight: SingleFlight,
}

impl UserFormController {
    pub fn new(app: Arc<AppState>, list: Arc<ListController<ManagedUser>>) -> Self {
        Self {
            app,
            list,
            surface: FormSurface::new(),
            in_flight: SingleFlight::new(),
        }
    }

    pub fn surface(&self) -> &FormSurface<UserForm> {
        &self.surface
    }

    pub fn open_new(&self) -> UserForm {
        let form = UserForm::default();
        self.surface.open(form.clone());
        form
    }

    pub fn open_edit(&self, id: &str) -> Option<UserForm> {
        let Some(user) = self.list.find(id) else {
            self.app.notifier.error(&format!("User {} not found", id));
            return None;
        };
        let form = UserForm::for_edit(&user);
        self.surface.open(form.clone());
        Some(form)
    }

    pub async fn save(&self, form: UserForm) -> SaveOutcome {
        let Some(_flight) = self.in_flight.try_begin("save user") else {
            return SaveOutcome::Busy;
        };

        let submission = match form.validate() {
            Ok(submission) => submission,
            Err(e) => {
                debug!(error = %e, "User form rejected");
                self.surface.reject(e);
                return SaveOutcome::Invalid(e);
            }
        };

        let (result, fallback, outcome) = {
            let _loading = self.app.loading.show();
            match submission {
                UserSubmission::Create {
                    register,
                    role,
                    active,
                } => (
                    self.create(register, role, active).await,
                    "Failed to create user",
                    SaveOutcome::Created,
                ),
                UserSubmission::Update { id, payload } => (
                    self.update(&id, &payload).await,
                    "Failed to update user",
                    SaveOutcome::Updated,
                ),
            }
        };

        match result {
            Ok(()) => {
                self.surface.close();
                let message = match outcome {
                    SaveOutcome::Created => "User created successfully",
                    _ => "User updated successfully",
                };
                info!(username = %form.username.trim(), "{}", message);
                self.app.notifier.success(message);
                resync(&self.list).await;
                outcome
            }
            Err(e) => match report_failure(&self.app, &e, fallback) {
                Some(message) => SaveOutcome::Failed(message),
                None => SaveOutcome::SessionExpired,
            },
        }
    }

    pub async fn delete(&self, id: &str) -> DeleteOutcome {
        let label = self
            .list
            .find(id)
            .and_then(|u| u.username)
            .map(|name| format!("user \"{}\"", name))
            .unwrap_or_else(|| format!("user {}", id));
        delete_entity(&self.app, &self.list, &self.in_flight, id, &label).await
    }

    async fn create(&self, register: RegisterRequest, role: Role, active: bool) -> Result<(), ApiError> {
        let envelope: Envelope<serde_json::Value> = self
            .app
            .api
            .call_public("/auth/register", Method::Post, Some(json_body(&register)?))
            .await?
            .envelope("Failed to create user")?;

        let Some(created) = envelope.user else {
            return Err(ApiError::MalformedPayload(
                "registration response did not include the new user".to_string(),
            ));
        };

        let follow_up = UserPayload {
            role: Some(role),
            active: Some(active),
            ..UserPayload::default()
        };
        if let Err(e) = self.update(&created.id, &follow_up).await {
            warn!(id = %created.id, error = %e, "User registered but role/status not applied");
            return Err(e);
        }
        Ok(())
    }

    async fn update(&self, id: &str, payload: &UserPayload) -> Result<(), ApiError> {
        let body = json_body(payload)?;
        send_mutation(
            &self.app,
            &ManagedUser::endpoint_for(id),
            Method::Put,
            Some(body),
            "Failed to update user",
        )
        .await
        .map(|_| ())
    }
}
