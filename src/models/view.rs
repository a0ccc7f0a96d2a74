//! Sort and search models for the student table.

use serde::{Deserialize, Serialize};

use super::StudentRecord;

/// Student fields the table can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Class,
    JoinedYear,
    TotalHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::TotalHours,
            direction: SortDirection::Descending,
        }
    }
}

/// Request body for setting the search term.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub term: String,
}

/// Request body for toggling the sort on a column.
#[derive(Debug, Clone, Deserialize)]
pub struct SortRequest {
    pub key: SortKey,
}

/// The filtered and sorted table as presented to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    pub students: Vec<StudentRecord>,
    /// Number of rows in the view
    pub shown: usize,
    /// Number of students in the roster
    pub total: usize,
    pub search: String,
    pub sort: SortConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}
