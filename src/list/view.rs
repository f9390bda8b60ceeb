//! Filtered and sorted projection of a cached collection.

use std::cmp::Ordering;

use crate::models::{Entity, SortValue};

/// Search and sort parameters of a list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState<F> {
    pub search_term: String,
    pub sort_field: F,
}

impl<F> ViewState<F> {
    pub fn new(sort_field: F) -> Self {
        Self {
            search_term: String::new(),
            sort_field,
        }
    }
}

/// Project `collection` through `state`. Never mutates the collection.
pub fn apply_view<E: Entity>(collection: &[E], state: &ViewState<E::Field>) -> Vec<E> {
    let needle = state.search_term.to_lowercase();

    let mut rows: Vec<E> = collection
        .iter()
        .filter(|e| matches_search(*e, &needle))
        .cloned()
        .collect();

    // sort_by is stable: equal keys keep server order
    let field = state.sort_field;
    rows.sort_by(|a, b| compare_values(a.sort_value(field), b.sort_value(field)));
    rows
}

/// Case-insensitive substring match against any search field.
/// `needle` must already be lowercase; an empty needle matches everything.
pub fn matches_search<E: Entity>(entity: &E, needle: &str) -> bool {
    needle.is_empty()
        || entity
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Ascending order with missing values last.
pub fn compare_values(a: Option<SortValue<'_>>, b: Option<SortValue<'_>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(SortValue::Text(x)), Some(SortValue::Text(y))) => collate(x, y),
        (Some(SortValue::Flag(x)), Some(SortValue::Flag(y))) => x.cmp(&y),
        _ => Ordering::Equal,
    }
}

/// Case-insensitive comparison that orders accented Portuguese letters
/// next to their base letter ("Índia" sorts with "india", not after "z").
pub fn collate(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b))
}

fn fold(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
