//! Tools listing command

use adpilot_core::advertising_registry;
use anyhow::Result;
use colored::Colorize;
use tracing::info;

/// Show available tools and their parameters
pub async fn tools_command() -> Result<()> {
    info!("Listing available tools");

    let registry = advertising_registry()?;

    println!("🛠️  Available Tools\n");

    for definition in registry.list() {
        let function = &definition.function;
        println!("📦 {}", function.name.bold());
        println!("   {}", function.description);

        let required: Vec<&str> = function.parameters["required"]
            .as_array()
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default();
        if let Some(properties) = function.parameters["properties"].as_object() {
            for (name, schema) in properties {
                let kind = schema["type"].as_str().unwrap_or("any");
                let marker = if required.contains(&name.as_str()) {
                    "required"
                } else {
                    "optional"
                };
                println!("     - {} ({}, {})", name, kind, marker.dimmed());
            }
        }
        println!();
    }

    println!("{} tools registered", registry.len());

    Ok(())
}
