//! Student record model and the request bodies that create or change one.

use serde::{Deserialize, Deserializer, Serialize};

/// A student whose volunteer hours are tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub class: String,
    pub joined_year: i32,
    /// Accumulated hours; only ever grows through confirmed increments
    pub total_hours: f64,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for adding a student.
///
/// Fields default to empty so that missing values surface as validation
/// messages instead of JSON rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class: String,
    /// A JSON number or numeric text; anything unparsable counts as missing.
    #[serde(default, deserialize_with = "year_from_number_or_text")]
    pub joined_year: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearField {
    Number(i32),
    Text(String),
}

fn year_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<YearField>::deserialize(deserializer)? {
        Some(YearField::Number(year)) => Some(year),
        Some(YearField::Text(raw)) => raw.trim().parse().ok(),
        None => None,
    })
}

/// A validated student ready to be handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDraft {
    pub name: String,
    pub class: String,
    pub joined_year: i32,
}

/// Raw hours as typed by the user, either a JSON number or text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HoursInput {
    Number(f64),
    Text(String),
}

impl Default for HoursInput {
    fn default() -> Self {
        HoursInput::Text(String::new())
    }
}

impl From<f64> for HoursInput {
    fn from(value: f64) -> Self {
        HoursInput::Number(value)
    }
}

impl From<&str> for HoursInput {
    fn from(value: &str) -> Self {
        HoursInput::Text(value.to_string())
    }
}

/// Request body for adding hours to a student.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddHoursRequest {
    #[serde(default)]
    pub hours: HoursInput,
}
