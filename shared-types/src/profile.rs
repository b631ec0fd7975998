use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::validation::{FormChecker, Validate, ValidationErrors};

pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Profile {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub timezone: String,
    pub avatar_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ProfileForm {
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileInput {
    pub full_name: String,
    pub job_title: Option<String>,
    pub timezone: String,
}

impl Validate for ProfileForm {
    type Output = ProfileInput;

    fn validate(&self) -> Result<ProfileInput, ValidationErrors> {
        let mut check = FormChecker::new();
        let input = ProfileInput {
            full_name: check.required_text(
                "full_name",
                self.full_name.as_ref(),
                100,
                "Full name is required",
            ),
            job_title: check.optional_text("job_title", self.job_title.as_ref(), 100),
            timezone: check
                .optional_text("timezone", self.timezone.as_ref(), 64)
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        };
        check.finish(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_timezone() {
        let form = ProfileForm {
            full_name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        let input = form.validate().unwrap();
        assert_eq!(input.timezone, "UTC");
        assert!(input.job_title.is_none());
    }

    #[test]
    fn test_full_name_required() {
        let errors = ProfileForm::default().validate().unwrap_err();
        assert_eq!(errors.first("full_name"), Some("Full name is required"));
    }
}
