use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A stored proposal. `id` and `submitted_at` are assigned by the store on insert
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Proposal {
    /// Auto-incrementing primary key.
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Add bike lane")]
    pub name: String,
    #[schema(example = "Add a bike lane on Main St")]
    pub description: Option<String>,
    /// Insertion instant, defaulted by the store.
    #[schema(example = "2024-05-01T12:30:00.123456")]
    pub submitted_at: NaiveDateTime,
}

/// Body of `POST /api/proposals`.
///
/// Both fields are optional at this layer: a missing `name` is passed through and
/// rejected by the store's NOT NULL constraint. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewProposal {
    #[schema(example = "Add bike lane")]
    pub name: Option<String>,
    #[schema(example = "Add a bike lane on Main St")]
    pub description: Option<String>,
}

impl NewProposal {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: Some(name.into()),
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn proposal_serializes_with_null_description() {
        let submitted_at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let proposal = Proposal {
            id: 7,
            name: "Plant trees".to_string(),
            description: None,
            submitted_at,
        };

        let value = serde_json::to_value(&proposal).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["name"], "Plant trees");
        assert!(value["description"].is_null());
        assert_eq!(value["submitted_at"], "2024-05-01T12:30:00");
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn new_proposal_tolerates_missing_and_unknown_fields() {
        let parsed: NewProposal =
            serde_json::from_str(r#"{"description":"no name","id":99,"extra":true}"#).unwrap();
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.description.as_deref(), Some("no name"));
    }
}
