//! Integration method recommendation from a free-form description

use super::{parse_model_json, read_file_safe};
use crate::llm::CompletionModel;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// The four supported integration approaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationMethod {
    CashierMode,
    PureApiMode,
    DropInMode,
    PaymentLinkMode,
}

impl IntegrationMethod {
    pub const ALL: [IntegrationMethod; 4] = [
        IntegrationMethod::CashierMode,
        IntegrationMethod::PureApiMode,
        IntegrationMethod::DropInMode,
        IntegrationMethod::PaymentLinkMode,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            IntegrationMethod::CashierMode => "cashier_mode",
            IntegrationMethod::PureApiMode => "pure_api_mode",
            IntegrationMethod::DropInMode => "drop_in_mode",
            IntegrationMethod::PaymentLinkMode => "payment_link_mode",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntegrationMethod::CashierMode => "Cashier Mode (Hosted Checkout)",
            IntegrationMethod::PureApiMode => "Pure API Mode",
            IntegrationMethod::DropInMode => "Drop-in Component Mode",
            IntegrationMethod::PaymentLinkMode => "Payment Link Mode",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            IntegrationMethod::CashierMode => "PayerMax hosted checkout page",
            IntegrationMethod::PureApiMode => "Direct API integration with full control",
            IntegrationMethod::DropInMode => "Embedded payment component",
            IntegrationMethod::PaymentLinkMode => "Share payment links with customers",
        }
    }

    pub fn complexity(&self) -> &'static str {
        match self {
            IntegrationMethod::CashierMode => "Low",
            IntegrationMethod::PureApiMode => "High",
            IntegrationMethod::DropInMode => "Medium",
            IntegrationMethod::PaymentLinkMode => "Very Low",
        }
    }

    pub fn pci_required(&self) -> bool {
        matches!(self, IntegrationMethod::PureApiMode)
    }

    pub fn frontend_work(&self) -> &'static str {
        match self {
            IntegrationMethod::CashierMode => "Minimal",
            IntegrationMethod::PureApiMode => "Extensive",
            IntegrationMethod::DropInMode => "Moderate",
            IntegrationMethod::PaymentLinkMode => "None",
        }
    }

    pub fn customization(&self) -> &'static str {
        match self {
            IntegrationMethod::CashierMode => "Limited",
            IntegrationMethod::PureApiMode => "Full",
            IntegrationMethod::DropInMode => "Moderate",
            IntegrationMethod::PaymentLinkMode => "Minimal",
        }
    }

    pub fn best_for(&self) -> &'static [&'static str] {
        match self {
            IntegrationMethod::CashierMode => &[
                "Quick integration with minimal frontend work",
                "No PCI DSS compliance required",
                "Support for multiple payment methods",
                "Built-in 3DS authentication",
                "Saved card functionality",
            ],
            IntegrationMethod::PureApiMode => &[
                "Full control over payment UI/UX",
                "Custom payment flows",
                "Mobile app integration",
                "Advanced customization needs",
            ],
            IntegrationMethod::DropInMode => &[
                "Balance between control and ease",
                "Custom UI with pre-built components",
                "No PCI DSS compliance required",
                "Saved card functionality",
            ],
            IntegrationMethod::PaymentLinkMode => &[
                "No website/app required",
                "Quick payment collection",
                "Social media/email payments",
                "Invoice payments",
            ],
        }
    }

    /// Integration guide documents for this method
    pub fn guide_paths(&self) -> &'static [&'static str] {
        match self {
            IntegrationMethod::CashierMode => &[
                "integration_process/收银台支付/收银台支付集成概览.md",
                "integration_process/收银台支付/收银台支付集成.md",
                "integration_process/收银台支付/收银台支付流程.md",
            ],
            IntegrationMethod::PureApiMode => &["integration_process/纯API模式/纯API支付集成.md"],
            IntegrationMethod::DropInMode => &["integration_process/开发者工具/卡支付前端接口.md"],
            IntegrationMethod::PaymentLinkMode => &["integration_process/链接支付/链接支付集成.md"],
        }
    }

    /// APIs a merchant must implement for this method
    pub fn required_apis(&self) -> &'static [&'static str] {
        match self {
            IntegrationMethod::CashierMode => &["收银台-下单", "交易查询", "支付结果通知", "页面回跳"],
            IntegrationMethod::PureApiMode => &["纯API支付", "交易查询", "支付确认", "支付结果通知"],
            IntegrationMethod::DropInMode => &[
                "Apply Drop-in Session",
                "前置组件支付",
                "交易查询",
                "支付结果通知",
            ],
            IntegrationMethod::PaymentLinkMode => &[
                "创建链接",
                "查询链接详情",
                "失效支付链接",
                "支付链接更新回调",
            ],
        }
    }

    /// Keyword heuristic used when no model is available
    pub fn from_keywords(description: &str) -> IntegrationMethod {
        let lower = description.to_lowercase();
        let matches = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if matches(&["quick", "simple", "easy", "fast"]) {
            IntegrationMethod::CashierMode
        } else if matches(&["custom", "control", "mobile app"]) {
            IntegrationMethod::PureApiMode
        } else if matches(&["component", "embed", "moderate"]) {
            IntegrationMethod::DropInMode
        } else if matches(&["link", "share", "email", "social"]) {
            IntegrationMethod::PaymentLinkMode
        } else {
            // Hosted checkout is the lowest-effort default
            IntegrationMethod::CashierMode
        }
    }
}

impl FromStr for IntegrationMethod {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> crate::error::Result<Self> {
        IntegrationMethod::ALL
            .iter()
            .copied()
            .find(|m| m.key() == value)
            .ok_or_else(|| {
                crate::error::Error::Config(format!("Unknown integration method '{}'", value))
            })
    }
}

#[derive(Debug, Deserialize)]
struct MethodRecommendation {
    #[serde(default)]
    recommended_method: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    considerations: Vec<String>,
    #[serde(default)]
    next_steps: Vec<String>,
}

/// Recommends an integration method and assembles its guide material
pub struct IntegrationAssistant {
    base_path: PathBuf,
    model: Option<Box<dyn CompletionModel>>,
}

impl IntegrationAssistant {
    pub fn new(base_path: PathBuf, model: Option<Box<dyn CompletionModel>>) -> Self {
        Self { base_path, model }
    }

    /// Analyze a requirement description and recommend a method.
    ///
    /// Runs two model steps (specification extraction, method choice);
    /// if either fails the keyword heuristic takes over.
    pub async fn analyze_requirements(&self, user_description: &str) -> Value {
        let Some(model) = &self.model else {
            return self.fallback_analysis(user_description);
        };

        let Some(specs) = self.extract_specifications(model.as_ref(), user_description).await
        else {
            return self.fallback_analysis(user_description);
        };

        let Some((method, recommendation)) = self
            .determine_method(model.as_ref(), user_description, &specs)
            .await
        else {
            return self.fallback_analysis(user_description);
        };

        json!({
            "user_description": user_description,
            "extracted_specifications": specs,
            "recommended_method": method_summary(method),
            "reasoning": recommendation.reasoning,
            "integration_guide": self.load_guide(method),
            "required_apis": method.required_apis(),
            "considerations": recommendation.considerations,
            "next_steps": recommendation.next_steps,
            "llm_powered": true
        })
    }

    async fn extract_specifications(
        &self,
        model: &dyn CompletionModel,
        user_description: &str,
    ) -> Option<Value> {
        let prompt = format!(
            r#"Analyze the following user description of their payment integration requirements and extract key specifications.

User Description:
{}

Extract and categorize the following information:
1. Payment methods needed (card, wallet, bank transfer, etc.)
2. Integration constraints (PCI compliance, development resources, timeline)
3. Required features (saved cards, subscriptions, refunds, etc.)
4. Technical environment (web, mobile app, backend only, etc.)
5. Customization needs (UI/UX control, branding, etc.)
6. Business requirements (transaction volume, markets, etc.)

Respond in JSON format:
{{
    "payment_methods": ["list of payment methods"],
    "constraints": {{
        "pci_compliance": true/false,
        "development_resources": "limited/moderate/extensive",
        "timeline": "urgent/normal/flexible"
    }},
    "required_features": ["list of features"],
    "technical_environment": ["web/mobile/backend"],
    "customization_level": "minimal/moderate/full",
    "business_context": "brief summary",
    "key_priorities": ["list of top priorities"]
}}"#,
            user_description
        );

        let response = match model.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Specification extraction unavailable: {}", e);
                return None;
            }
        };
        parse_model_json(&response)
    }

    async fn determine_method(
        &self,
        model: &dyn CompletionModel,
        user_description: &str,
        specs: &Value,
    ) -> Option<(IntegrationMethod, MethodRecommendation)> {
        let methods_desc = IntegrationMethod::ALL
            .iter()
            .map(|m| {
                format!(
                    "Method: {}\nName: {}\nDescription: {}\nBest for: {}\nComplexity: {}\nPCI Required: {}\nFrontend Work: {}\nCustomization: {}",
                    m.key(),
                    m.name(),
                    m.description(),
                    m.best_for().join(", "),
                    m.complexity(),
                    m.pci_required(),
                    m.frontend_work(),
                    m.customization()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            r#"You are a PayerMax integration expert. Based on the user's requirements and extracted specifications, recommend the BEST integration method.

User Description:
{}

Extracted Specifications:
{}

Available Integration Methods:
{}

Instructions:
1. Analyze the user's requirements and constraints
2. Match them against each integration method's characteristics
3. Select the SINGLE best method
4. Provide clear reasoning
5. List important considerations
6. Suggest next steps

Respond in JSON format:
{{
    "recommended_method": "method_key",
    "reasoning": "detailed explanation of why this method is best",
    "considerations": ["important points to consider"],
    "next_steps": ["ordered list of next steps"],
    "alternative_methods": ["other viable options if any"]
}}"#,
            user_description,
            serde_json::to_string_pretty(specs).unwrap_or_default(),
            methods_desc
        );

        let response = match model.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Method recommendation unavailable: {}", e);
                return None;
            }
        };

        let recommendation: MethodRecommendation = parse_model_json(&response)?;
        let method = recommendation.recommended_method.parse().ok()?;
        Some((method, recommendation))
    }

    fn load_guide(&self, method: IntegrationMethod) -> Value {
        let mut documents = Map::new();
        for path in method.guide_paths() {
            if let Some(content) = read_file_safe(&self.base_path.join(path)) {
                documents.insert(path.to_string(), Value::String(content));
            }
        }
        json!({
            "documents": documents,
            "document_paths": method.guide_paths()
        })
    }

    fn fallback_analysis(&self, user_description: &str) -> Value {
        let method = IntegrationMethod::from_keywords(user_description);

        json!({
            "user_description": user_description,
            "extracted_specifications": {
                "note": "LLM not available, using keyword-based analysis"
            },
            "recommended_method": method_summary(method),
            "reasoning": format!(
                "Based on keyword analysis, {} appears to be a good fit.",
                method.name()
            ),
            "integration_guide": self.load_guide(method),
            "required_apis": method.required_apis(),
            "considerations": method.best_for(),
            "next_steps": [
                "Review the integration guide",
                "Set up development environment",
                "Obtain API credentials",
                "Implement required APIs"
            ],
            "llm_powered": false
        })
    }
}

fn method_summary(method: IntegrationMethod) -> Value {
    json!({
        "method": method.key(),
        "name": method.name(),
        "description": method.description(),
        "complexity": method.complexity()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct SequencedModel {
        responses: Vec<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionModel for SequencedModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .responses
                .get(idx)
                .cloned()
                .unwrap_or_else(|| "{}".to_string()))
        }

        fn model_name(&self) -> &str {
            "sequenced"
        }
    }

    #[test]
    fn test_keyword_mapping() {
        assert_eq!(
            IntegrationMethod::from_keywords("we need something quick and simple"),
            IntegrationMethod::CashierMode
        );
        assert_eq!(
            IntegrationMethod::from_keywords("full control in our mobile app"),
            IntegrationMethod::PureApiMode
        );
        assert_eq!(
            IntegrationMethod::from_keywords("embed a component in checkout"),
            IntegrationMethod::DropInMode
        );
        assert_eq!(
            IntegrationMethod::from_keywords("send a payment link by email"),
            IntegrationMethod::PaymentLinkMode
        );
        assert_eq!(
            IntegrationMethod::from_keywords("we sell shoes"),
            IntegrationMethod::CashierMode
        );
    }

    #[test]
    fn test_method_keys_round_trip() {
        for method in IntegrationMethod::ALL {
            assert_eq!(method.key().parse::<IntegrationMethod>().unwrap(), method);
            assert!(!method.required_apis().is_empty());
            assert!(!method.guide_paths().is_empty());
        }
    }

    #[tokio::test]
    async fn test_no_model_uses_keyword_fallback() {
        let tmp = TempDir::new().unwrap();
        let assistant = IntegrationAssistant::new(tmp.path().to_path_buf(), None);
        let result = assistant.analyze_requirements("quick checkout please").await;

        assert_eq!(result["llm_powered"], false);
        assert_eq!(result["recommended_method"]["method"], "cashier_mode");
        assert_eq!(result["required_apis"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_model_recommendation_applied() {
        let tmp = TempDir::new().unwrap();
        let model = SequencedModel {
            responses: vec![
                r#"{"payment_methods": ["card"], "customization_level": "full"}"#.to_string(),
                r#"{"recommended_method": "pure_api_mode", "reasoning": "full control needed", "considerations": ["PCI scope"], "next_steps": ["read the guide"]}"#.to_string(),
            ],
            calls: AtomicUsize::new(0),
        };
        let assistant = IntegrationAssistant::new(tmp.path().to_path_buf(), Some(Box::new(model)));
        let result = assistant
            .analyze_requirements("custom flows in our mobile app")
            .await;

        assert_eq!(result["llm_powered"], true);
        assert_eq!(result["recommended_method"]["method"], "pure_api_mode");
        assert_eq!(result["reasoning"], "full control needed");
        assert_eq!(result["considerations"][0], "PCI scope");
        assert_eq!(result["extracted_specifications"]["payment_methods"][0], "card");
    }

    #[tokio::test]
    async fn test_unknown_method_key_falls_back() {
        let tmp = TempDir::new().unwrap();
        let model = SequencedModel {
            responses: vec![
                r#"{"payment_methods": []}"#.to_string(),
                r#"{"recommended_method": "telepathy_mode", "reasoning": "?"}"#.to_string(),
            ],
            calls: AtomicUsize::new(0),
        };
        let assistant = IntegrationAssistant::new(tmp.path().to_path_buf(), Some(Box::new(model)));
        let result = assistant.analyze_requirements("whatever works").await;

        assert_eq!(result["llm_powered"], false);
    }
}
