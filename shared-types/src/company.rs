use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::contact::Contact;
use crate::deal::DealWithDetails;
use crate::validation::{FormChecker, Validate, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Company {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub domain: Option<String>,
    pub industry: Option<String>,
    /// Size bracket, e.g. "11-50".
    pub size: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Id and name of a company, as embedded in joined rows and pickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CompanyForm {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyInput {
    pub name: String,
    pub domain: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

impl Validate for CompanyForm {
    type Output = CompanyInput;

    fn validate(&self) -> Result<CompanyInput, ValidationErrors> {
        let mut check = FormChecker::new();

        let input = CompanyInput {
            name: check.required_text("name", self.name.as_ref(), 200, "Company name is required"),
            domain: check.optional_text("domain", self.domain.as_ref(), 200),
            industry: check.optional_text("industry", self.industry.as_ref(), 100),
            size: check.optional_text("size", self.size.as_ref(), 20),
            phone: check.optional_text("phone", self.phone.as_ref(), 30),
            address: check.optional_text("address", self.address.as_ref(), 200),
            city: check.optional_text("city", self.city.as_ref(), 100),
            state: check.optional_text("state", self.state.as_ref(), 100),
            country: check.optional_text("country", self.country.as_ref(), 100),
            notes: check.optional_text("notes", self.notes.as_ref(), 5000),
        };

        check.finish(input)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompaniesResponse {
    pub companies: Vec<Company>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyOptionsResponse {
    pub companies: Vec<CompanyRef>,
}

/// People working at a company, by last name.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyContactsResponse {
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyDealsResponse {
    pub deals: Vec<DealWithDetails>,
}
