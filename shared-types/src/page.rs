//! Data behind each server-rendered page.
//!
//! Protected pages are wrapped in [`Page`], which carries the signed-in user shown in the
//! sidebar and header next to the page-specific payload.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::activity::{ActivitiesResponse, ActivityWithRefs};
use crate::company::{Company, CompanyRef, CompaniesResponse};
use crate::contact::{Contact, ContactRef, ContactWithCompany, ContactsResponse};
use crate::dashboard::{DashboardStats, StageSummary};
use crate::deal::{DealContact, DealStage, DealWithDetails, DealsResponse};
use crate::note::Note;
use crate::pipeline::PipelineBoard;
use crate::profile::Profile;

/// The signed-in user as the page chrome shows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Viewer {
    pub user_id: String,
    pub email: String,
    /// Full name when the profile has one, the email otherwise.
    pub name: String,
    pub avatar_url: Option<String>,
}

impl Viewer {
    pub fn new(user_id: &str, email: Option<&str>, profile: Option<&Profile>) -> Self {
        let email = email.unwrap_or_default().to_string();
        let name = profile
            .and_then(|p| p.full_name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());
        Self {
            user_id: user_id.to_string(),
            email,
            name,
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub viewer: Viewer,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardPage {
    pub stats: DashboardStats,
    pub pipeline: Vec<StageSummary>,
    pub upcoming: Vec<ActivityWithRefs>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactsPage {
    pub contacts: ContactsResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactFormPage {
    /// `None` on the "new" page.
    pub contact: Option<ContactWithCompany>,
    pub companies: Vec<CompanyRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactDetailPage {
    pub contact: ContactWithCompany,
    pub activities: Vec<ActivityWithRefs>,
    pub notes: Vec<Note>,
    pub deals: Vec<DealWithDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompaniesPage {
    pub companies: CompaniesResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyFormPage {
    pub company: Option<Company>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyDetailPage {
    pub company: Company,
    pub contacts: Vec<Contact>,
    pub deals: Vec<DealWithDetails>,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealBoardPage {
    pub board: PipelineBoard,
    pub total_deals: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealListPage {
    pub deals: DealsResponse,
    pub stages: Vec<DealStage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealFormPage {
    pub deal: Option<DealWithDetails>,
    pub stages: Vec<DealStage>,
    pub companies: Vec<CompanyRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealDetailPage {
    pub deal: DealWithDetails,
    pub contacts: Vec<DealContact>,
    pub activities: Vec<ActivityWithRefs>,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivitiesPage {
    pub activities: ActivitiesResponse,
    pub contacts: Vec<ContactRef>,
    /// Type filter currently applied, `""` for all.
    pub current_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfilePage {
    pub profile: Profile,
}

/// Public sign-in, sign-up and password reset pages. The forms talk to the identity
/// provider directly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuthPage {
    pub page: String,
    pub title: String,
    pub provider_url: Option<String>,
    /// Where to go once signed in.
    pub redirect_to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(full_name: Option<&str>) -> Profile {
        Profile {
            user_id: "u1".to_string(),
            email: None,
            full_name: full_name.map(str::to_string),
            job_title: None,
            timezone: "UTC".to_string(),
            avatar_url: Some("https://example.com/a.png".to_string()),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_viewer_prefers_full_name() {
        let p = profile(Some("Jane Doe"));
        let viewer = Viewer::new("u1", Some("jane@example.com"), Some(&p));
        assert_eq!(viewer.name, "Jane Doe");
        assert_eq!(viewer.avatar_url.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn test_viewer_falls_back_to_email() {
        let p = profile(Some("  "));
        assert_eq!(
            Viewer::new("u1", Some("jane@example.com"), Some(&p)).name,
            "jane@example.com"
        );
        let bare = Viewer::new("u1", None, None);
        assert_eq!(bare.name, "");
        assert!(bare.avatar_url.is_none());
    }
}
