//! Plain-text table rendering for the list pages.

use crate::format::{count_label, format_phone, format_tax_id};
use crate::models::{Entity, ManagedUser, Supplier};

/// An entity that knows how to lay itself out as a table row.
pub trait TableRow: Entity {
    /// Column headers and widths.
    const COLUMNS: &'static [(&'static str, usize)];

    fn cells(&self) -> Vec<String>;
}

impl TableRow for Supplier {
    const COLUMNS: &'static [(&'static str, usize)] =
        &[("NAME", 28), ("CNPJ", 18), ("EMAIL", 32), ("PHONE", 15)];

    fn cells(&self) -> Vec<String> {
        vec![
            or_dash(self.name.as_deref()),
            self.tax_id.as_deref().map(format_tax_id).unwrap_or_else(dash),
            or_dash(self.email.as_deref()),
            self.phone.as_deref().map(format_phone).unwrap_or_else(dash),
        ]
    }
}

impl TableRow for ManagedUser {
    const COLUMNS: &'static [(&'static str, usize)] =
        &[("USERNAME", 20), ("EMAIL", 32), ("ROLE", 8), ("ACTIVE", 6)];

    fn cells(&self) -> Vec<String> {
        vec![
            or_dash(self.username.as_deref()),
            or_dash(self.email.as_deref()),
            self.role.map(|r| r.to_string()).unwrap_or_else(dash),
            match self.active {
                Some(true) => "Yes".to_string(),
                Some(false) => "No".to_string(),
                None => dash(),
            },
        ]
    }
}

/// Rendered page plus the row number → entity id bindings used by row actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedTable {
    pub text: String,
    pub bindings: Vec<String>,
}

impl RenderedTable {
    /// Resolve a 1-based row number, or an id present in the table.
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        if let Ok(row) = reference.parse::<usize>() {
            if let Some(id) = row.checked_sub(1).and_then(|i| self.bindings.get(i)) {
                return Some(id);
            }
        }
        self.bindings
            .iter()
            .find(|id| id.as_str() == reference)
            .map(String::as_str)
    }
}

pub fn render_table<E: TableRow>(rows: &[E]) -> RenderedTable {
    let mut text = String::new();
    text.push_str(&count_label(rows.len(), E::SINGULAR, E::PLURAL));
    text.push('\n');

    if rows.is_empty() {
        text.push_str(&format!("\n  No {} found.\n", E::PLURAL));
        return RenderedTable {
            text,
            bindings: Vec::new(),
        };
    }

    let width: usize = 5 + E::COLUMNS.iter().map(|(_, w)| w + 2).sum::<usize>();

    text.push('\n');
    text.push_str(&format!("{:>3}  ", "#"));
    for (header, w) in E::COLUMNS {
        text.push_str(&format!("{:<w$}  ", header, w = *w));
    }
    text.push('\n');
    text.push_str(&"-".repeat(width));
    text.push('\n');

    let mut bindings = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        text.push_str(&format!("{:>3}  ", i + 1));
        for ((_, w), cell) in E::COLUMNS.iter().zip(row.cells()) {
            text.push_str(&format!("{:<w$}  ", truncate(&cell, *w), w = *w));
        }
        text.push('\n');
        bindings.push(row.id().to_string());
    }

    RenderedTable { text, bindings }
}

fn dash() -> String {
    "-".to_string()
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).map(str::to_string).unwrap_or_else(dash)
}

/// Truncate to `max_len` characters with an ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
