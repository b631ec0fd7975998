use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::activity::ActivityWithRefs;

/// Headline numbers for the dashboard page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_contacts: i64,
    pub total_deal_value: f64,
    pub won_deals: i64,
    pub won_deal_value: f64,
    /// Deals sitting in a stage that is neither won nor lost.
    pub open_deals: i64,
    pub overdue_activities: i64,
    pub recent_activities: Vec<ActivityWithRefs>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StageSummary {
    pub stage_id: String,
    pub name: String,
    pub color: Option<String>,
    pub display_order: i64,
    pub deal_count: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PipelineSummaryResponse {
    pub stages: Vec<StageSummary>,
}
