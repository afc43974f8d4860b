//! Recommend command implementation

use crate::config::Config;
use crate::error::Result;
use crate::llm::create_completion_model;
use crate::tools::IntegrationAssistant;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

/// Recommend an integration method from a natural-language description
pub async fn cmd_recommend(
    config: &Config,
    docs_dir: PathBuf,
    user_description: &str,
) -> Result<Value> {
    info!("Analyzing integration requirements");

    let model = match create_completion_model(&config.completion) {
        Ok(model) => Some(model),
        Err(e) => {
            warn!("Completion model unavailable, using keyword analysis: {}", e);
            None
        }
    };

    let assistant = IntegrationAssistant::new(docs_dir, model);
    Ok(assistant.analyze_requirements(user_description).await)
}

/// Print recommendation to console
pub fn print_recommendation(result: &Value) {
    let method = &result["recommended_method"];

    println!("\n💡 Recommended integration method\n");
    println!("  Method:     {}", method["name"].as_str().unwrap_or("?"));
    println!("  Complexity: {}", method["complexity"].as_str().unwrap_or("?"));
    println!("\n{}", method["description"].as_str().unwrap_or(""));
    println!("\nReasoning: {}", result["reasoning"].as_str().unwrap_or(""));

    if let Some(apis) = result["required_apis"].as_array() {
        if !apis.is_empty() {
            println!("\nRequired APIs:");
            for api in apis {
                println!("  • {}", api.as_str().unwrap_or("?"));
            }
        }
    }

    if let Some(steps) = result["next_steps"].as_array() {
        if !steps.is_empty() {
            println!("\nNext steps:");
            for (i, step) in steps.iter().enumerate() {
                println!("  {}. {}", i + 1, step.as_str().unwrap_or("?"));
            }
        }
    }

    if !result["llm_powered"].as_bool().unwrap_or(false) {
        println!("\n(keyword-based analysis; configure a completion backend for better results)");
    }
}
