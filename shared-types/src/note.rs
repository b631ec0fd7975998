use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::{FormChecker, Validate, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub contact_id: Option<String>,
    pub company_id: Option<String>,
    pub deal_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct NoteForm {
    pub content: Option<String>,
    pub contact_id: Option<String>,
    pub company_id: Option<String>,
    pub deal_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteInput {
    pub content: String,
    pub contact_id: Option<String>,
    pub company_id: Option<String>,
    pub deal_id: Option<String>,
}

impl Validate for NoteForm {
    type Output = NoteInput;

    fn validate(&self) -> Result<NoteInput, ValidationErrors> {
        let mut check = FormChecker::new();
        let input = NoteInput {
            content: check.required_text(
                "content",
                self.content.as_ref(),
                10_000,
                "Note content is required",
            ),
            contact_id: check.optional_uuid("contact_id", self.contact_id.as_ref()),
            company_id: check.optional_uuid("company_id", self.company_id.as_ref()),
            deal_id: check.optional_uuid("deal_id", self.deal_id.as_ref()),
        };
        check.finish(input)
    }
}

/// Which record a list of notes hangs off.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NoteListQuery {
    pub contact_id: Option<String>,
    pub company_id: Option<String>,
    pub deal_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotesResponse {
    pub notes: Vec<Note>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_required() {
        let errors = NoteForm::default().validate().unwrap_err();
        assert_eq!(errors.first("content"), Some("Note content is required"));
    }

    #[test]
    fn test_content_length_bound() {
        let form = NoteForm {
            content: Some("n".repeat(10_001)),
            ..Default::default()
        };
        assert!(form.validate().unwrap_err().contains("content"));

        let form = NoteForm {
            content: Some("n".repeat(10_000)),
            ..Default::default()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_associations() {
        let form = NoteForm {
            content: Some("Called, left a voicemail".to_string()),
            contact_id: Some("550E8400-E29B-41D4-A716-446655440000".to_string()),
            deal_id: Some(String::new()),
            company_id: Some("acme".to_string()),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.contains("company_id"));
        assert!(!errors.contains("contact_id"));
        assert!(!errors.contains("deal_id"));
    }
}
