use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

pub mod activity;
pub mod company;
pub mod contact;
pub mod dashboard;
pub mod deal;
pub mod format;
pub mod note;
pub mod page;
pub mod pipeline;
pub mod profile;
pub mod validation;

pub use activity::{
    ActivitiesResponse, Activity, ActivityFeedQuery, ActivityFeedResponse, ActivityForm,
    ActivityInput, ActivityListQuery, ActivityType, ActivityWithRefs,
};
pub use company::{
    CompaniesResponse, Company, CompanyContactsResponse, CompanyDealsResponse, CompanyForm,
    CompanyInput, CompanyListQuery, CompanyOptionsResponse, CompanyRef,
};
pub use contact::{
    Contact, ContactForm, ContactInput, ContactListQuery, ContactOptionsResponse, ContactRef,
    ContactStatus, ContactWithCompany, ContactsResponse,
};
pub use dashboard::{DashboardStats, PipelineSummaryResponse, StageSummary};
pub use deal::{
    Deal, DealContact, DealContactForm, DealContactInput, DealContactsResponse, DealForm,
    DealInput, DealListQuery, DealPositionUpdate, DealRef, DealStage, DealWithDetails,
    DealsResponse, MoveDealRequest, ReorderDealsRequest, StagesResponse,
};
pub use note::{Note, NoteForm, NoteInput, NoteListQuery, NotesResponse};
pub use page::{
    ActivitiesPage, AuthPage, CompaniesPage, CompanyDetailPage, CompanyFormPage,
    ContactDetailPage, ContactFormPage, ContactsPage, DashboardPage, DealBoardPage,
    DealDetailPage, DealFormPage, DealListPage, Page, ProfilePage, Viewer,
};
pub use pipeline::{BoardColumn, BoardError, DragLocation, DragResult, PipelineBoard};
pub use profile::{Profile, ProfileForm, ProfileInput};
pub use validation::{NumericInput, Validate, ValidationErrors};

/// Rows per page on every paginated list.
pub const PAGE_SIZE: u32 = 20;

/// Error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
    /// Per-field messages, present on validation failures.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            error: "Validation failed".to_string(),
            fields: Some(errors.fields),
        }
    }
}

/// Acknowledgement returned by deletes and moves.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_fields_are_optional_on_the_wire() {
        let plain = serde_json::to_value(ErrorResponse::new("Not found")).unwrap();
        assert_eq!(plain, serde_json::json!({ "error": "Not found" }));

        let parsed: ErrorResponse = serde_json::from_str(r#"{"error":"Not found"}"#).unwrap();
        assert!(parsed.fields.is_none());

        assert!(ErrorResponse::decl().contains("fields?:"));
    }
}
