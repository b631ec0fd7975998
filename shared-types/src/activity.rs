use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::contact::ContactRef;
use crate::deal::DealRef;
use crate::validation::{FormChecker, Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    Task,
    Note,
}

impl ActivityType {
    pub const ALL: [(&'static str, ActivityType); 5] = [
        ("call", ActivityType::Call),
        ("email", ActivityType::Email),
        ("meeting", ActivityType::Meeting),
        ("task", ActivityType::Task),
        ("note", ActivityType::Note),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Call => "call",
            ActivityType::Email => "email",
            ActivityType::Meeting => "meeting",
            ActivityType::Task => "task",
            ActivityType::Note => "note",
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| format!("unknown activity type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    pub is_completed: bool,
    pub completed_at: Option<i64>,
    pub contact_id: Option<String>,
    pub deal_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Activity {
    pub fn is_overdue(&self, now: i64) -> bool {
        !self.is_completed && matches!(self.due_date, Some(due) if due < now)
    }
}

/// An activity joined with the contact and deal it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityWithRefs {
    #[serde(flatten)]
    pub activity: Activity,
    pub contact: Option<ContactRef>,
    pub deal: Option<DealRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ActivityForm {
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub contact_id: Option<String>,
    pub deal_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityInput {
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    pub contact_id: Option<String>,
    pub deal_id: Option<String>,
}

impl Validate for ActivityForm {
    type Output = ActivityInput;

    fn validate(&self) -> Result<ActivityInput, ValidationErrors> {
        let mut check = FormChecker::new();

        let activity_type = check.required_one_of(
            "type",
            self.activity_type.as_ref(),
            &ActivityType::ALL,
            "Activity type is required",
        );
        let title = check.required_text("title", self.title.as_ref(), 200, "Title is required");
        let description = check.optional_text("description", self.description.as_ref(), 5000);
        let due_date = check.optional_datetime("due_date", self.due_date.as_ref());
        let contact_id = check.optional_uuid("contact_id", self.contact_id.as_ref());
        let deal_id = check.optional_uuid("deal_id", self.deal_id.as_ref());

        let input = activity_type.map(|activity_type| ActivityInput {
            activity_type,
            title,
            description,
            due_date,
            contact_id,
            deal_id,
        });

        match check.finish(input)? {
            Some(input) => Ok(input),
            // required_one_of always records an error when it returns None
            None => Err(ValidationErrors::single("type", "Activity type is required")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub completed: Option<bool>,
    pub contact_id: Option<String>,
    pub deal_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityFeedQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityWithRefs>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityFeedResponse {
    pub activities: Vec<ActivityWithRefs>,
}
