use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::company::CompanyRef;
use crate::contact::ContactRef;
use crate::validation::{
    is_valid_uuid, FormChecker, NumericInput, Validate, ValidationErrors,
};

pub const DEFAULT_CURRENCY: &str = "USD";

/// A column of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealStage {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
    pub display_order: i64,
    pub is_won: bool,
    pub is_lost: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Deal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub value: Option<f64>,
    pub currency: String,
    pub probability: Option<i64>,
    pub stage_id: String,
    pub company_id: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub expected_close_date: Option<String>,
    pub description: Option<String>,
    /// Ordering within the stage column, starting at 0.
    pub position: i64,
    pub won_at: Option<i64>,
    pub lost_at: Option<i64>,
    pub lost_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A deal joined with its stage and company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealWithDetails {
    #[serde(flatten)]
    pub deal: Deal,
    pub stage: DealStage,
    pub company: Option<CompanyRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealContact {
    pub deal_id: String,
    pub contact_id: String,
    pub role: Option<String>,
    pub contact: ContactRef,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct DealForm {
    pub title: Option<String>,
    #[ts(type = "number | string | null")]
    pub value: Option<NumericInput>,
    pub currency: Option<String>,
    pub stage_id: Option<String>,
    pub company_id: Option<String>,
    pub expected_close_date: Option<String>,
    #[ts(type = "number | string | null")]
    pub probability: Option<NumericInput>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DealInput {
    pub title: String,
    pub value: Option<f64>,
    pub currency: String,
    pub stage_id: String,
    pub company_id: Option<String>,
    pub expected_close_date: Option<String>,
    pub probability: Option<i64>,
    pub description: Option<String>,
}

impl Validate for DealForm {
    type Output = DealInput;

    fn validate(&self) -> Result<DealInput, ValidationErrors> {
        let mut check = FormChecker::new();

        let title = check.required_text("title", self.title.as_ref(), 200, "Deal title is required");

        let value = check.optional_number("value", self.value.as_ref());
        if matches!(value, Some(v) if v < 0.0) {
            check.fail("value", "Value must be positive");
        }

        let currency = match check.optional_text("currency", self.currency.as_ref(), 3) {
            Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                code.to_ascii_uppercase()
            }
            Some(_) => {
                check.fail("currency", "Currency must be a 3-letter code");
                DEFAULT_CURRENCY.to_string()
            }
            None => DEFAULT_CURRENCY.to_string(),
        };

        let probability = match check.optional_number("probability", self.probability.as_ref()) {
            Some(p) if !(0.0..=100.0).contains(&p) => {
                check.fail("probability", "Probability must be between 0 and 100");
                None
            }
            // Stored as a whole percentage.
            Some(p) => Some(p.round() as i64),
            None => None,
        };

        let input = DealInput {
            title,
            value,
            currency,
            stage_id: check.required_uuid("stage_id", self.stage_id.as_ref(), "Stage is required"),
            company_id: check.optional_uuid("company_id", self.company_id.as_ref()),
            expected_close_date: check
                .optional_date("expected_close_date", self.expected_close_date.as_ref()),
            probability,
            description: check.optional_text("description", self.description.as_ref(), 5000),
        };

        check.finish(input)
    }
}

/// Drop of a deal card onto a stage column at a given index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MoveDealRequest {
    pub deal_id: String,
    pub stage_id: String,
    pub position: i64,
}

impl Validate for MoveDealRequest {
    type Output = MoveDealRequest;

    fn validate(&self) -> Result<MoveDealRequest, ValidationErrors> {
        let mut check = FormChecker::new();
        if !is_valid_uuid(&self.deal_id) {
            check.fail("deal_id", "Invalid UUID");
        }
        if !is_valid_uuid(&self.stage_id) {
            check.fail("stage_id", "Invalid UUID");
        }
        if self.position < 0 {
            check.fail("position", "Position must be zero or greater");
        }
        check.finish(MoveDealRequest {
            deal_id: self.deal_id.to_lowercase(),
            stage_id: self.stage_id.to_lowercase(),
            position: self.position,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealPositionUpdate {
    pub id: String,
    pub stage_id: String,
    pub position: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReorderDealsRequest {
    pub updates: Vec<DealPositionUpdate>,
}

impl Validate for ReorderDealsRequest {
    type Output = Vec<MoveDealRequest>;

    fn validate(&self) -> Result<Vec<MoveDealRequest>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut moves = Vec::with_capacity(self.updates.len());

        for (index, update) in self.updates.iter().enumerate() {
            let request = MoveDealRequest {
                deal_id: update.id.clone(),
                stage_id: update.stage_id.clone(),
                position: update.position,
            };
            match request.validate() {
                Ok(valid) => moves.push(valid),
                Err(failed) => {
                    for (field, messages) in failed.fields {
                        for message in messages {
                            errors.add(&format!("updates[{}].{}", index, field), message);
                        }
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(moves)
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct DealContactForm {
    pub contact_id: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DealContactInput {
    pub contact_id: String,
    pub role: Option<String>,
}

impl Validate for DealContactForm {
    type Output = DealContactInput;

    fn validate(&self) -> Result<DealContactInput, ValidationErrors> {
        let mut check = FormChecker::new();
        let input = DealContactInput {
            contact_id: check.required_uuid(
                "contact_id",
                self.contact_id.as_ref(),
                "Contact is required",
            ),
            role: check.optional_text("role", self.role.as_ref(), 100),
        };
        check.finish(input)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub stage_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealsResponse {
    pub deals: Vec<DealWithDetails>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StagesResponse {
    pub stages: Vec<DealStage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DealContactsResponse {
    pub contacts: Vec<DealContact>,
}
