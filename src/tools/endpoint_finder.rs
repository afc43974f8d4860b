//! API endpoint selection from structured task parameters

use super::{parse_model_json, read_file_safe, truncate_chars};
use crate::index::discover_markdown;
use crate::llm::CompletionModel;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// What the caller wants to accomplish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    CreatePayment,
    QueryPayment,
    ConfirmPayment,
    Refund,
    QueryRefund,
    Payout,
    QueryPayout,
    Tokenization,
    Subscription,
    PaymentLink,
    Dispute,
    Balance,
    Exchange,
    RiskControl,
}

impl TaskType {
    pub const ALL: [TaskType; 14] = [
        TaskType::CreatePayment,
        TaskType::QueryPayment,
        TaskType::ConfirmPayment,
        TaskType::Refund,
        TaskType::QueryRefund,
        TaskType::Payout,
        TaskType::QueryPayout,
        TaskType::Tokenization,
        TaskType::Subscription,
        TaskType::PaymentLink,
        TaskType::Dispute,
        TaskType::Balance,
        TaskType::Exchange,
        TaskType::RiskControl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::CreatePayment => "create_payment",
            TaskType::QueryPayment => "query_payment",
            TaskType::ConfirmPayment => "confirm_payment",
            TaskType::Refund => "refund",
            TaskType::QueryRefund => "query_refund",
            TaskType::Payout => "payout",
            TaskType::QueryPayout => "query_payout",
            TaskType::Tokenization => "tokenization",
            TaskType::Subscription => "subscription",
            TaskType::PaymentLink => "payment_link",
            TaskType::Dispute => "dispute",
            TaskType::Balance => "balance",
            TaskType::Exchange => "exchange",
            TaskType::RiskControl => "risk_control",
        }
    }

    /// Document categories searched for this task, in priority order
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            TaskType::CreatePayment => &["payment_acceptance", "drop_in", "payment_link"],
            TaskType::QueryPayment => &["payment_acceptance"],
            TaskType::ConfirmPayment => &["payment_acceptance"],
            TaskType::Refund => &["refund"],
            TaskType::QueryRefund => &["refund"],
            TaskType::Payout => &["payout"],
            TaskType::QueryPayout => &["payout"],
            TaskType::Tokenization => &["tokenization"],
            TaskType::Subscription => &["subscription"],
            TaskType::PaymentLink => &["payment_link"],
            TaskType::Dispute => &["dispute"],
            TaskType::Balance => &["fund_management"],
            TaskType::Exchange => &["fund_management"],
            TaskType::RiskControl => &["risk_control"],
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> crate::error::Result<Self> {
        TaskType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| crate::error::Error::Config(format!("Unknown task_type '{}'", value)))
    }
}

/// Parameters for an endpoint lookup
#[derive(Debug, Clone)]
pub struct EndpointQuery {
    pub task_type: TaskType,
    pub payment_type: Option<String>,
    pub integration_mode: Option<String>,
    pub additional_requirements: Option<String>,
    pub include_samples: bool,
}

/// A candidate API document loaded from disk
#[derive(Debug, Clone)]
struct CandidateApi {
    api_name: String,
    category: String,
    doc_path: String,
    summary: String,
    full_content: String,
}

/// The strict JSON contract the model must answer with
#[derive(Debug, Deserialize)]
struct SelectionResponse {
    #[serde(default)]
    selected_api_number: Option<usize>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    alternative_api_numbers: Vec<usize>,
    #[serde(default)]
    integration_notes: String,
}

/// Selects the best API document for a structured task description
pub struct EndpointFinder {
    base_path: PathBuf,
    model: Option<Box<dyn CompletionModel>>,
}

impl EndpointFinder {
    pub fn new(base_path: PathBuf, model: Option<Box<dyn CompletionModel>>) -> Self {
        Self { base_path, model }
    }

    /// Find the best API endpoint for the given requirements.
    ///
    /// Selection is model-assisted when a model is configured and more
    /// than one candidate exists; otherwise rule-based.
    pub async fn find_endpoint(&self, query: &EndpointQuery) -> Value {
        let candidates = self.collect_candidates(query.task_type);

        if candidates.is_empty() {
            return json!({
                "error": format!("No APIs found for task_type: {}", query.task_type),
                "available_task_types": TaskType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>()
            });
        }

        if candidates.len() > 1 {
            if let Some(model) = &self.model {
                if let Some(result) = self.model_select(model.as_ref(), &candidates, query).await {
                    return result;
                }
            }
        }

        self.fallback_select(&candidates, query)
    }

    fn collect_candidates(&self, task_type: TaskType) -> Vec<CandidateApi> {
        let mut candidates = Vec::new();
        for category in task_type.categories() {
            let dir = self.base_path.join("api-docs").join(category);
            if !dir.exists() {
                continue;
            }
            for path in discover_markdown(&dir) {
                let Some(content) = read_file_safe(&path) else {
                    continue;
                };
                let doc_path = path
                    .strip_prefix(&self.base_path)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                candidates.push(CandidateApi {
                    api_name: path
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    category: category.to_string(),
                    doc_path,
                    summary: truncate_chars(&content, 500).to_string(),
                    full_content: content,
                });
            }
        }
        candidates
    }

    async fn model_select(
        &self,
        model: &dyn CompletionModel,
        candidates: &[CandidateApi],
        query: &EndpointQuery,
    ) -> Option<Value> {
        let prompt = build_selection_prompt(candidates, query);

        let response = match model.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Selection model unavailable: {}", e);
                return None;
            }
        };

        let selection: SelectionResponse = parse_model_json(&response)?;
        let selected_idx = selection.selected_api_number?.checked_sub(1)?;
        let selected = candidates.get(selected_idx)?;

        let alternatives: Vec<Value> = selection
            .alternative_api_numbers
            .iter()
            .filter_map(|n| n.checked_sub(1).and_then(|i| candidates.get(i)))
            .map(candidate_summary)
            .collect();

        let sample_code = query
            .include_samples
            .then(|| self.sample_code(&selected.doc_path))
            .flatten();

        Some(json!({
            "task_type": query.task_type.as_str(),
            "payment_type": query.payment_type,
            "integration_mode": query.integration_mode,
            "selected_api": {
                "api_name": selected.api_name,
                "category": selected.category,
                "doc_path": selected.doc_path,
                "specification": selected.full_content
            },
            "reasoning": selection.reasoning,
            "sample_code": sample_code,
            "alternative_apis": alternatives,
            "integration_notes": selection.integration_notes,
            "llm_powered": true
        }))
    }

    fn fallback_select(&self, candidates: &[CandidateApi], query: &EndpointQuery) -> Value {
        let selected = &candidates[0];

        let sample_code = query
            .include_samples
            .then(|| self.sample_code(&selected.doc_path))
            .flatten();

        let alternatives: Vec<Value> = candidates
            .iter()
            .skip(1)
            .take(2)
            .map(candidate_summary)
            .collect();

        json!({
            "task_type": query.task_type.as_str(),
            "payment_type": query.payment_type,
            "integration_mode": query.integration_mode,
            "selected_api": {
                "api_name": selected.api_name,
                "category": selected.category,
                "doc_path": selected.doc_path,
                "specification": selected.full_content
            },
            "reasoning": format!(
                "Selected based on task_type '{}' and category matching",
                query.task_type
            ),
            "sample_code": sample_code,
            "alternative_apis": alternatives,
            "integration_notes": "Review the specification for detailed integration requirements",
            "llm_powered": false
        })
    }

    /// Sample code lives in a parallel tree: api-docs/... -> api-samples/...
    fn sample_code(&self, doc_path: &str) -> Option<String> {
        let sample_path = doc_path.replace("api-docs", "api-samples");
        read_file_safe(&self.base_path.join(sample_path))
    }
}

fn candidate_summary(api: &CandidateApi) -> Value {
    json!({
        "api_name": api.api_name,
        "category": api.category,
        "doc_path": api.doc_path
    })
}

fn build_selection_prompt(candidates: &[CandidateApi], query: &EndpointQuery) -> String {
    // Bound the prompt: at most 10 candidates, summaries capped at 300 chars
    let api_list = candidates
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, api)| {
            format!(
                "API {}: {}\nCategory: {}\nSummary: {}...",
                i + 1,
                api.api_name,
                api.category,
                truncate_chars(&api.summary, 300)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an expert in PayerMax payment API integration. Analyze the following APIs and select the MOST appropriate one for the given requirements.

Task Type: {}
Payment Type: {}
Integration Mode: {}
Additional Requirements: {}

Available APIs:
{}

Instructions:
1. Analyze each API's purpose and capabilities
2. Select the SINGLE best matching API for the requirements
3. Provide clear reasoning for your selection
4. Suggest 1-2 alternative APIs if applicable

Respond in JSON format:
{{
    "selected_api_number": <number>,
    "reasoning": "<detailed explanation>",
    "alternative_api_numbers": [<numbers>],
    "integration_notes": "<important notes for using this API>"
}}"#,
        query.task_type,
        query.payment_type.as_deref().unwrap_or("any"),
        query.integration_mode.as_deref().unwrap_or("any"),
        query.additional_requirements.as_deref().unwrap_or("none"),
        api_list
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct CannedModel {
        response: String,
    }

    #[async_trait]
    impl CompletionModel for CannedModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.response.clone())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn docs_fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let refund_dir = tmp.path().join("api-docs/refund");
        fs::create_dir_all(&refund_dir).unwrap();
        fs::write(refund_dir.join("refund.md"), "# Refund API\nissue a refund").unwrap();
        fs::write(refund_dir.join("refund-query.md"), "# Refund Query\ncheck refund").unwrap();

        let sample_dir = tmp.path().join("api-samples/refund");
        fs::create_dir_all(&sample_dir).unwrap();
        fs::write(sample_dir.join("refund.md"), "sample refund request").unwrap();
        tmp
    }

    fn refund_query() -> EndpointQuery {
        EndpointQuery {
            task_type: TaskType::Refund,
            payment_type: None,
            integration_mode: None,
            additional_requirements: None,
            include_samples: true,
        }
    }

    #[test]
    fn test_task_type_round_trips() {
        for task in TaskType::ALL {
            assert_eq!(task.as_str().parse::<TaskType>().unwrap(), task);
            assert!(!task.categories().is_empty());
        }
        assert!("unknown_task".parse::<TaskType>().is_err());
    }

    #[tokio::test]
    async fn test_no_candidates_lists_task_types() {
        let tmp = TempDir::new().unwrap();
        let finder = EndpointFinder::new(tmp.path().to_path_buf(), None);
        let result = finder.find_endpoint(&refund_query()).await;

        assert!(result["error"].as_str().unwrap().contains("refund"));
        assert_eq!(result["available_task_types"].as_array().unwrap().len(), 14);
    }

    #[tokio::test]
    async fn test_fallback_selects_first_candidate() {
        let tmp = docs_fixture();
        let finder = EndpointFinder::new(tmp.path().to_path_buf(), None);
        let result = finder.find_endpoint(&refund_query()).await;

        assert_eq!(result["llm_powered"], false);
        // Files are discovered in path order
        assert_eq!(result["selected_api"]["api_name"], "refund-query");
        assert_eq!(result["selected_api"]["category"], "refund");
        assert_eq!(result["alternative_apis"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_model_selection_applied() {
        let tmp = docs_fixture();
        let model = CannedModel {
            response: r#"```json
{"selected_api_number": 2, "reasoning": "exact match", "alternative_api_numbers": [1], "integration_notes": "sign requests"}
```"#
                .to_string(),
        };
        let finder = EndpointFinder::new(tmp.path().to_path_buf(), Some(Box::new(model)));
        let result = finder.find_endpoint(&refund_query()).await;

        assert_eq!(result["llm_powered"], true);
        assert_eq!(result["selected_api"]["api_name"], "refund");
        assert_eq!(result["reasoning"], "exact match");
        assert_eq!(result["integration_notes"], "sign requests");
        assert_eq!(result["sample_code"], "sample refund request");
        assert_eq!(
            result["alternative_apis"][0]["api_name"],
            "refund-query"
        );
    }

    #[tokio::test]
    async fn test_invalid_model_json_falls_back() {
        let tmp = docs_fixture();
        let model = CannedModel {
            response: "the second one looks right".to_string(),
        };
        let finder = EndpointFinder::new(tmp.path().to_path_buf(), Some(Box::new(model)));
        let result = finder.find_endpoint(&refund_query()).await;

        assert_eq!(result["llm_powered"], false);
        assert_eq!(result["selected_api"]["api_name"], "refund-query");
    }

    #[tokio::test]
    async fn test_out_of_range_selection_falls_back() {
        let tmp = docs_fixture();
        let model = CannedModel {
            response: r#"{"selected_api_number": 99, "reasoning": "?"}"#.to_string(),
        };
        let finder = EndpointFinder::new(tmp.path().to_path_buf(), Some(Box::new(model)));
        let result = finder.find_endpoint(&refund_query()).await;

        assert_eq!(result["llm_powered"], false);
    }

    #[test]
    fn test_prompt_bounded_to_ten_candidates() {
        let candidates: Vec<CandidateApi> = (0..15)
            .map(|i| CandidateApi {
                api_name: format!("api-{}", i),
                category: "payment_acceptance".to_string(),
                doc_path: format!("api-docs/payment_acceptance/api-{}.md", i),
                summary: "s".repeat(600),
                full_content: String::new(),
            })
            .collect();

        let prompt = build_selection_prompt(&candidates, &refund_query());
        assert!(prompt.contains("API 10:"));
        assert!(!prompt.contains("API 11:"));
    }
}
