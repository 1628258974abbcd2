//! Built-in advertising tools
//!
//! These return fixed sample data. In production each one is replaced by an
//! adapter over the ads reporting API with the same name and parameters.

pub mod account;
pub mod campaigns;
pub mod creative;

pub use account::AccountOverviewTool;
pub use campaigns::{AdsTool, CampaignMetricsTool, KeywordsTool, SearchTermsTool};
pub use creative::{AdCopyTool, WeeklyReportTool};

use crate::error::ToolError;
use crate::tools::{Tool, ToolRegistry};
use std::sync::Arc;

/// Registry with every built-in advertising tool
pub fn advertising_registry() -> Result<ToolRegistry, ToolError> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(AccountOverviewTool),
        Arc::new(CampaignMetricsTool),
        Arc::new(SearchTermsTool),
        Arc::new(KeywordsTool),
        Arc::new(AdsTool),
        Arc::new(AdCopyTool),
        Arc::new(WeeklyReportTool),
    ];

    let builder = tools
        .into_iter()
        .try_fold(ToolRegistry::builder(), |builder, tool| builder.register(tool))?;
    Ok(builder.build())
}
