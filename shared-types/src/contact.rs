use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::company::CompanyRef;
use crate::validation::{FormChecker, Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    Active,
    Inactive,
    Lead,
}

impl ContactStatus {
    pub const ALL: [(&'static str, ContactStatus); 3] = [
        ("active", ContactStatus::Active),
        ("inactive", ContactStatus::Inactive),
        ("lead", ContactStatus::Lead),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Active => "active",
            ContactStatus::Inactive => "inactive",
            ContactStatus::Lead => "lead",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, status)| *status)
            .ok_or_else(|| format!("unknown contact status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Contact {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub company_id: Option<String>,
    pub status: ContactStatus,
    pub source: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A contact row joined with the name of its company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactWithCompany {
    #[serde(flatten)]
    pub contact: Contact,
    pub company: Option<CompanyRef>,
}

/// Minimal contact shape used by pickers and joined rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

/// Raw contact form as submitted by a browser or API client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ContactForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub company_id: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// A contact form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub company_id: Option<String>,
    pub status: ContactStatus,
    pub source: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Validate for ContactForm {
    type Output = ContactInput;

    fn validate(&self) -> Result<ContactInput, ValidationErrors> {
        let mut check = FormChecker::new();

        let input = ContactInput {
            first_name: check.required_text(
                "first_name",
                self.first_name.as_ref(),
                100,
                "First name is required",
            ),
            last_name: check.required_text(
                "last_name",
                self.last_name.as_ref(),
                100,
                "Last name is required",
            ),
            email: check.optional_email("email", self.email.as_ref()),
            phone: check.optional_text("phone", self.phone.as_ref(), 30),
            job_title: check.optional_text("job_title", self.job_title.as_ref(), 100),
            company_id: check.optional_uuid("company_id", self.company_id.as_ref()),
            status: check.one_of(
                "status",
                self.status.as_ref(),
                &ContactStatus::ALL,
                ContactStatus::Active,
            ),
            source: check.optional_text("source", self.source.as_ref(), 50),
            address: check.optional_text("address", self.address.as_ref(), 200),
            city: check.optional_text("city", self.city.as_ref(), 100),
            state: check.optional_text("state", self.state.as_ref(), 100),
            country: check.optional_text("country", self.country.as_ref(), 100),
        };

        check.finish(input)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactsResponse {
    pub contacts: Vec<ContactWithCompany>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactOptionsResponse {
    pub contacts: Vec<ContactRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ContactForm {
        ContactForm {
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_required_fields_only() {
        let input = valid_form().validate().unwrap();
        assert_eq!(input.first_name, "John");
        assert_eq!(input.status, ContactStatus::Active);
        assert!(input.email.is_none());
    }

    #[test]
    fn test_requires_names() {
        let errors = ContactForm::default().validate().unwrap_err();
        assert_eq!(errors.first("first_name"), Some("First name is required"));
        assert_eq!(errors.first("last_name"), Some("Last name is required"));

        let blank = ContactForm {
            first_name: Some("   ".to_string()),
            ..valid_form()
        };
        assert!(blank.validate().unwrap_err().contains("first_name"));
    }

    #[test]
    fn test_rejects_invalid_email() {
        let form = ContactForm {
            email: Some("not-an-email".to_string()),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.first("email"), Some("Invalid email"));
    }

    #[test]
    fn test_empty_optional_strings_are_absent() {
        let form = ContactForm {
            email: Some(String::new()),
            company_id: Some(String::new()),
            phone: Some(String::new()),
            ..valid_form()
        };
        let input = form.validate().unwrap();
        assert!(input.email.is_none());
        assert!(input.company_id.is_none());
        assert!(input.phone.is_none());
    }

    #[test]
    fn test_rejects_non_uuid_company() {
        let form = ContactForm {
            company_id: Some("acme".to_string()),
            ..valid_form()
        };
        assert!(form.validate().unwrap_err().contains("company_id"));
    }

    #[test]
    fn test_status_enumeration() {
        let lead = ContactForm {
            status: Some("lead".to_string()),
            ..valid_form()
        };
        assert_eq!(lead.validate().unwrap().status, ContactStatus::Lead);

        let bogus = ContactForm {
            status: Some("archived".to_string()),
            ..valid_form()
        };
        assert!(bogus.validate().unwrap_err().contains("status"));
    }

    #[test]
    fn test_length_bounds() {
        let form = ContactForm {
            first_name: Some("a".repeat(101)),
            phone: Some("1".repeat(31)),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.contains("first_name"));
        assert!(errors.contains("phone"));
    }
}
