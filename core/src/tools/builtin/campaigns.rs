//! Campaign, search term, keyword and ad reporting

use crate::error::Result;
use crate::tools::{ParamKind, ParameterSpec, Tool, ToolArgs};
use async_trait::async_trait;
use serde_json::{json, Value};

fn date_range_param() -> ParameterSpec {
    ParameterSpec::required(
        "date_range",
        ParamKind::String,
        "Reporting period, formatted as YYYY-MM-DD to YYYY-MM-DD",
    )
}

fn ad_group_param() -> ParameterSpec {
    ParameterSpec::required("ad_group_id", ParamKind::String, "Ad group identifier")
}

/// Performance metrics per campaign
pub struct CampaignMetricsTool;

#[async_trait]
impl Tool for CampaignMetricsTool {
    fn name(&self) -> &str {
        "get_campaign_metrics"
    }

    fn description(&self) -> &str {
        "Fetches performance metrics for campaigns."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            date_range_param(),
            ParameterSpec::optional(
                "campaign_ids",
                ParamKind::StringArray,
                "Restrict the report to these campaign ids",
            ),
        ]
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value> {
        Ok(json!([
            {
                "id": "123",
                "name": "Summer Sale 2024",
                "clicks": 4500,
                "conversions": 120,
                "cost": 850.0,
                "status": "Enabled"
            },
            {
                "id": "456",
                "name": "Brand Search - Global",
                "clicks": 1200,
                "conversions": 85,
                "cost": 320.0,
                "status": "Enabled"
            }
        ]))
    }
}

/// Search terms that triggered ads in a campaign
pub struct SearchTermsTool;

#[async_trait]
impl Tool for SearchTermsTool {
    fn name(&self) -> &str {
        "get_search_terms"
    }

    fn description(&self) -> &str {
        "Returns search terms with performance metrics."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("campaign_id", ParamKind::String, "Campaign identifier"),
            date_range_param(),
            ParameterSpec::optional(
                "min_spend",
                ParamKind::Number,
                "Only include terms that spent at least this much",
            )
            .with_default(json!(0.0)),
        ]
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value> {
        Ok(json!([
            {"term": "buy sneakers online", "clicks": 120, "cost": 45.0, "conversions": 12},
            {"term": "running shoes reviews", "clicks": 80, "cost": 20.0, "conversions": 4},
            {"term": "best athletic footwear", "clicks": 50, "cost": 35.0, "conversions": 0}
        ]))
    }
}

/// Keyword-level performance
pub struct KeywordsTool;

#[async_trait]
impl Tool for KeywordsTool {
    fn name(&self) -> &str {
        "get_keywords"
    }

    fn description(&self) -> &str {
        "Fetches keyword-level performance data."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ad_group_param(), date_range_param()]
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value> {
        Ok(json!([
            {"keyword": "sneakers", "match_type": "Broad", "clicks": 500, "conversions": 25},
            {"keyword": "+buy +running +shoes", "match_type": "Phrase", "clicks": 200, "conversions": 15}
        ]))
    }
}

/// Ad creatives with their performance
pub struct AdsTool;

#[async_trait]
impl Tool for AdsTool {
    fn name(&self) -> &str {
        "get_ads"
    }

    fn description(&self) -> &str {
        "Returns ad creatives and their performance metrics."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ad_group_param(), date_range_param()]
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value> {
        Ok(json!([
            {
                "id": "ad1",
                "type": "RSA",
                "headlines": ["Buy Quality Sneakers", "Best Running Shoes 2024"],
                "descriptions": ["Fast shipping on all orders.", "Shop our new collection today!"],
                "clicks": 300,
                "conversions": 12
            }
        ]))
    }
}
