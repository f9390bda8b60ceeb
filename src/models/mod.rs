//! Entities cached by the list pages.

mod supplier;
mod user;

pub use supplier::{Supplier, SupplierField, SupplierPayload};
pub use user::{ManagedUser, Role, UserField, UserPayload, UserProfile};

use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A sortable value pulled out of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortValue<'a> {
    Text(&'a str),
    Flag(bool),
}

/// A record the list controller can cache, filter and sort.
pub trait Entity: Clone + Debug + DeserializeOwned + Send + Sync + 'static {
    /// Field enum offered by the sort selector.
    type Field: Copy + Debug + PartialEq + Send + Sync + 'static;

    /// Collection endpoint, e.g. `/suppliers`.
    const ENDPOINT: &'static str;
    const SINGULAR: &'static str;
    const PLURAL: &'static str;

    fn id(&self) -> &str;

    /// Text fields matched by the search box.
    fn search_fields(&self) -> Vec<&str>;

    /// Value for `field`, `None` when the server omitted it.
    fn sort_value(&self, field: Self::Field) -> Option<SortValue<'_>>;

    /// Endpoint of a single record.
    fn endpoint_for(id: &str) -> String {
        format!("{}/{}", Self::ENDPOINT, id)
    }
}
