use std::sync::Arc;
use tracing::{debug, info};

use super::validation::{
    validate_email, validate_phone, validate_required, validate_tax_id, ValidationError,
};
use super::{
    delete_entity, report_failure, resync, send_mutation, DeleteOutcome, FormSurface, SaveOutcome,
};
use crate::api::{json_body, Method};
use crate::format::{format_phone, format_tax_id};
use crate::list::ListController;
use crate::models::{Entity, Supplier, SupplierPayload};
use crate::ui::SingleFlight;
use crate::AppState;

/// Raw input of the supplier dialog. Tax id and phone may be masked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplierForm {
    /// Set when editing an existing supplier
    pub id: Option<String>,
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub phone: String,
}

impl SupplierForm {
    /// Prefill from a cached supplier, masked the way the inputs show it.
    pub fn for_edit(supplier: &Supplier) -> Self {
        Self {
            id: Some(supplier.id.clone()),
            name: supplier.name.clone().unwrap_or_default(),
            tax_id: format_tax_id(supplier.tax_id.as_deref().unwrap_or_default()),
            email: supplier.email.clone().unwrap_or_default(),
            phone: format_phone(supplier.phone.as_deref().unwrap_or_default()),
        }
    }

    /// First failing rule wins. The payload carries digits only.
    pub fn validate(&self) -> Result<SupplierPayload, ValidationError> {
        let name = validate_required(&self.name, ValidationError::NameRequired)?;
        let tax_id = validate_tax_id(&self.tax_id)?;
        let email = validate_email(&self.email)?;
        let phone = validate_phone(&self.phone)?;
        Ok(SupplierPayload {
            name,
            tax_id,
            email,
            phone,
        })
    }
}

pub struct SupplierFormController {
    app: Arc<AppState>,
    list: Arc<ListController<Supplier>>,
    surface: FormSurface<SupplierForm>,
    in_flight: SingleFlight,
}

impl SupplierFormController {
    pub fn new(app: Arc<AppState>, list: Arc<ListController<Supplier>>) -> Self {
        Self {
            app,
            list,
            surface: FormSurface::new(),
            in_flight: SingleFlight::new(),
        }
    }

    pub fn surface(&self) -> &FormSurface<SupplierForm> {
        &self.surface
    }

    pub fn open_new(&self) -> SupplierForm {
        let form = SupplierForm::default();
        self.surface.open(form.clone());
        form
    }

    /// Open the dialog for a supplier in the cached list.
    pub fn open_edit(&self, id: &str) -> Option<SupplierForm> {
        let Some(supplier) = self.list.find(id) else {
            self.app.notifier.error(&format!("Supplier {} not found", id));
            return None;
        };
        let form = SupplierForm::for_edit(&supplier);
        self.surface.open(form.clone());
        Some(form)
    }

    /// Create or update depending on `form.id`, then reload the list.
    pub async fn save(&self, form: SupplierForm) -> SaveOutcome {
        let Some(_flight) = self.in_flight.try_begin("save supplier") else {
            return SaveOutcome::Busy;
        };

        let payload = match form.validate() {
            Ok(payload) => payload,
            Err(e) => {
                debug!(error = %e, "Supplier form rejected");
                self.surface.reject(e);
                return SaveOutcome::Invalid(e);
            }
        };

        let (path, method, verb) = match &form.id {
            Some(id) => (Supplier::endpoint_for(id), Method::Put, "update"),
            None => (Supplier::ENDPOINT.to_string(), Method::Post, "create"),
        };
        let fallback = format!("Failed to {} supplier", verb);

        let result = {
            let _loading = self.app.loading.show();
            match json_body(&payload) {
                Ok(body) => send_mutation(&self.app, &path, method, Some(body), &fallback).await,
                Err(e) => Err(e),
            }
        };

        match result {
            Ok(_) => {
                self.surface.close();
                let outcome = if form.id.is_some() {
                    self.app.notifier.success("Supplier updated successfully");
                    SaveOutcome::Updated
                } else {
                    self.app.notifier.success("Supplier created successfully");
                    SaveOutcome::Created
                };
                info!(name = %payload.name, ?outcome, "Supplier saved");
                resync(&self.list).await;
                outcome
            }
            Err(e) => match report_failure(&self.app, &e, &fallback) {
                Some(message) => SaveOutcome::Failed(message),
                None => SaveOutcome::SessionExpired,
            },
        }
    }

    /// Ask for confirmation, then delete and reload.
    pub async fn delete(&self, id: &str) -> DeleteOutcome {
        let label = self
            .list
            .find(id)
            .and_then(|s| s.name)
            .map(|name| format!("supplier \"{}\"", name))
            .unwrap_or_else(|| format!("supplier {}", id));
        delete_entity(&self.app, &self.list, &self.in_flight, id, &label).await
    }
}
