use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::payload::{Collection, Envelope};
use super::transport::{ApiRequest, Method, Transport};
use super::{is_auth_failure, ApiError};
use crate::models::Entity;
use crate::session::SessionStore;
use crate::ui::{Navigator, Route};

/// Status and decoded JSON body of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` for 204 and empty bodies
    pub json: Option<Value>,
}

impl ApiResponse {
    pub fn envelope<D: DeserializeOwned>(self, fallback: &str) -> Result<Envelope<D>, ApiError> {
        Envelope::decode(self.json, fallback)
    }
}

/// Thin wrapper over the transport that owns the auth conventions: bearer
/// header from the session, and forced logout on 401/403/422.
#[derive(Clone)]
pub struct ApiGateway {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    navigator: Navigator,
}

impl ApiGateway {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore, navigator: Navigator) -> Self {
        Self {
            transport,
            session,
            navigator,
        }
    }

    /// Authenticated call. An auth-failure status clears the session,
    /// redirects to login and returns [`ApiError::SessionExpired`].
    pub async fn call(
        &self,
        path: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(path, method, body, true).await
    }

    /// Call for the login/register endpoints: no bearer header, and auth
    /// statuses are ordinary errors carrying the server message.
    pub async fn call_public(
        &self,
        path: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(path, method, body, false).await
    }

    /// GET an entity collection, normalized to a sequence.
    pub async fn fetch_collection<E: Entity>(&self) -> Result<Vec<E>, ApiError> {
        let envelope: Envelope<Collection<E>> = self
            .call(E::ENDPOINT, Method::Get, None)
            .await?
            .envelope(&format!("Failed to load {}", E::PLURAL))?;
        Ok(envelope.data.unwrap_or_default().into_vec())
    }

    async fn dispatch(
        &self,
        path: &str,
        method: Method,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<ApiResponse, ApiError> {
        let mut headers = Vec::new();
        if authenticated {
            if let Some(token) = self.session.token() {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        let request = ApiRequest {
            method,
            path: path.to_string(),
            headers,
            body,
        };

        let raw = self.transport.send(request).await?;
        let status = raw.status;
        debug!(method = method.as_str(), path, status, "API response");

        if authenticated && is_auth_failure(status) {
            warn!(path, status, "Session rejected by server, signing out");
            self.session.clear();
            self.navigator.redirect(Route::Login);
            return Err(ApiError::SessionExpired { status });
        }

        let success = (200..300).contains(&status);

        if status == 204 || raw.body.trim().is_empty() {
            return if success {
                Ok(ApiResponse { status, json: None })
            } else {
                Err(ApiError::from_status(status, None))
            };
        }

        let json = match serde_json::from_str::<Value>(&raw.body) {
            Ok(json) => Some(json),
            Err(e) if success => return Err(ApiError::MalformedPayload(e.to_string())),
            Err(_) => None,
        };

        if !success {
            return Err(ApiError::from_status(status, json.as_ref()));
        }

        Ok(ApiResponse { status, json })
    }
}

/// Serialize a request body.
pub fn json_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::MalformedPayload(e.to_string()))
}
