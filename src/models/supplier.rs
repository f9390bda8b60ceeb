use serde::{Deserialize, Serialize};

use super::{Entity, SortValue};

/// Supplier as returned by `GET /suppliers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// CNPJ, 14 digits
    #[serde(default, rename = "cnpj")]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Body of `POST /suppliers` and `PUT /suppliers/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPayload {
    pub name: String,
    #[serde(rename = "cnpj")]
    pub tax_id: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SupplierField {
    #[default]
    Name,
    #[value(name = "cnpj", alias = "tax-id")]
    #[serde(rename = "cnpj", alias = "tax_id")]
    TaxId,
    Email,
    Phone,
}

impl Entity for Supplier {
    type Field = SupplierField;

    const ENDPOINT: &'static str = "/suppliers";
    const SINGULAR: &'static str = "supplier";
    const PLURAL: &'static str = "suppliers";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        [&self.name, &self.tax_id, &self.email, &self.phone]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .collect()
    }

    fn sort_value(&self, field: SupplierField) -> Option<SortValue<'_>> {
        let value = match field {
            SupplierField::Name => &self.name,
            SupplierField::TaxId => &self.tax_id,
            SupplierField::Email => &self.email,
            SupplierField::Phone => &self.phone,
        };
        value.as_deref().map(SortValue::Text)
    }
}

impl From<&Supplier> for SupplierPayload {
    fn from(supplier: &Supplier) -> Self {
        Self {
            name: supplier.name.clone().unwrap_or_default(),
            tax_id: supplier.tax_id.clone().unwrap_or_default(),
            email: supplier.email.clone().unwrap_or_default(),
            phone: supplier.phone.clone().unwrap_or_default(),
        }
    }
}
