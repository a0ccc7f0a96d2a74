//! Filtered and sorted projections of the roster.
//!
//! Everything here is pure. The table is always `sort(filter(records, term))`
//! recomputed from the full roster.

use std::cmp::Ordering;

use crate::models::{SortConfig, SortDirection, SortKey, StudentRecord, StudentView};

/// Search term and sort order chosen by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub search: String,
    pub sort: SortConfig,
}

/// Records whose name contains `term`, ignoring case, in input order.
pub fn filter<'a>(records: &'a [StudentRecord], term: &str) -> Vec<&'a StudentRecord> {
    if term.is_empty() {
        return records.iter().collect();
    }

    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| record.name.to_lowercase().contains(&needle))
        .collect()
}

/// Stable sort by the configured key.
pub fn sort<'a>(mut records: Vec<&'a StudentRecord>, config: SortConfig) -> Vec<&'a StudentRecord> {
    records.sort_by(|a, b| {
        let ordering = compare(a, b, config.key);
        match config.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    records
}

/// Clicking the current column flips its direction; a new column starts ascending.
pub fn toggle_sort(current: SortConfig, key: SortKey) -> SortConfig {
    if current.key == key {
        SortConfig {
            key,
            direction: current.direction.flipped(),
        }
    } else {
        SortConfig {
            key,
            direction: SortDirection::Ascending,
        }
    }
}

pub fn derive<'a>(
    records: &'a [StudentRecord],
    term: &str,
    config: SortConfig,
) -> Vec<&'a StudentRecord> {
    sort(filter(records, term), config)
}

/// Build the table payload, including the empty-state message.
pub fn present(records: &[StudentRecord], state: &ViewState) -> StudentView {
    let students: Vec<StudentRecord> = derive(records, &state.search, state.sort)
        .into_iter()
        .cloned()
        .collect();

    let empty_message = if records.is_empty() {
        Some("No students added yet".to_string())
    } else if students.is_empty() && !state.search.is_empty() {
        Some(format!(
            "No students match your search for \"{}\"",
            state.search
        ))
    } else {
        None
    };

    StudentView {
        shown: students.len(),
        total: records.len(),
        students,
        search: state.search.clone(),
        sort: state.sort,
        empty_message,
    }
}

fn compare(a: &StudentRecord, b: &StudentRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Class => a.class.cmp(&b.class),
        SortKey::JoinedYear => a.joined_year.cmp(&b.joined_year),
        SortKey::TotalHours => a.total_hours.total_cmp(&b.total_hours),
    }
}
