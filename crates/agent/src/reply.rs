//! Reply selection
//!
//! An ordered keyword rule table drives the demo: first match wins and a
//! fixed default applies when nothing matches, so a run is reproducible.
//! A generative chat backend can be enabled ahead of the table; any
//! failure there (auth, quota, network, parse) falls back to the rules.

use async_trait::async_trait;
use callsim_config::ReplyConfig;
use callsim_core::{CsAction, Error, ReplyDecision, ReplySelector, Result};
use callsim_llm::{ChatBackend, LlmConfig, Message, OpenAiChatBackend};
use regex::Regex;

/// Substituted by the orchestrator when reply selection fails outright
pub const TECHNICAL_DIFFICULTY_REPLY: &str = "מצטער, יש בעיה טכנית. נא נסה מאוחר יותר.";

struct ReplyRule {
    pattern: Regex,
    reply: &'static str,
    action: CsAction,
}

impl ReplyRule {
    fn new(pattern: &str, reply: &'static str, action: CsAction) -> Self {
        Self {
            // patterns are fixed literals
            pattern: Regex::new(pattern).expect("invalid reply rule pattern"),
            reply,
            action,
        }
    }
}

/// Deterministic keyword-based selector
pub struct RuleReplySelector {
    rules: Vec<ReplyRule>,
    default_reply: &'static str,
    default_action: CsAction,
}

impl RuleReplySelector {
    pub fn new() -> Self {
        let rules = vec![
            // Cancellation request: start identity verification
            ReplyRule::new(
                "בטל|ביטול",
                "אנא אשר את מספר תעודת הזהות שלך כדי שנוכל להמשיך.",
                CsAction::Verify,
            ),
            // Written-confirmation request: collect the email address
            ReplyRule::new(
                "אישור|איך אדע",
                "נשלח אישור למייל ברגע שהביטול יושלם. מה כתובת המייל שלך?",
                CsAction::Verify,
            ),
            // "What should I do" questions: explain the policy
            ReplyRule::new(
                "מה עליי לעשות|כיצד|איך",
                "המדיניות שלנו היא ביטול מיידי ללא קנסות. האם תרצה להמשיך?",
                CsAction::Explain,
            ),
            // Done/closed phrasing: confirm completion
            ReplyRule::new(
                "סיימתם|בוצע|בוצעה|סגור",
                "הבקשה התקבלה ותטופל בהקדם.",
                CsAction::Confirm,
            ),
            // Goodbye phrasing: wrap up the conversation
            ReplyRule::new(
                "תודה|להתראות|סיימנו",
                "תודה שפנית לשירות הלקוחות. יום נעים!",
                CsAction::Close,
            ),
        ];

        Self {
            rules,
            default_reply: "האם ברצונך שאבצע את הביטול כעת?",
            default_action: CsAction::Explain,
        }
    }

    /// First matching rule wins; the default applies otherwise
    pub fn select(&self, user_text: &str) -> ReplyDecision {
        let text = user_text.trim();
        for rule in &self.rules {
            if rule.pattern.is_match(text) {
                return ReplyDecision::new(rule.reply, rule.action);
            }
        }
        ReplyDecision::new(self.default_reply, self.default_action)
    }
}

impl Default for RuleReplySelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Generative selector over a chat backend
pub struct GenerativeReplier {
    backend: Box<dyn ChatBackend>,
}

impl GenerativeReplier {
    pub fn new(backend: Box<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Build from settings; None when no backend can be constructed
    pub fn from_config(config: &ReplyConfig) -> Option<Self> {
        let llm_config = LlmConfig {
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            ..Default::default()
        };
        match OpenAiChatBackend::new(llm_config) {
            Ok(backend) => Some(Self::new(Box::new(backend))),
            Err(e) => {
                tracing::warn!("generative reply backend unusable: {e}");
                None
            }
        }
    }

    fn prompt(user_text: &str) -> Vec<Message> {
        vec![
            Message::system(
                "אתה נציג שירות לקוחות של חברת טלוויזיה. \
                 המטרה: לבצע תהליך ביטול מנוי בצורה מקצועית. \
                 השלבים: בקשת אימות זהות, הסבר מדיניות ביטול, אישור סופי, סגירה. \
                 החזר JSON בלבד בפורמט \
                 {\"reply\": \"...\", \"action\": \"verify|explain|confirm|close\"}.",
            ),
            Message::user(format!("הלקוח אמר: \"{user_text}\"")),
        ]
    }

    /// Extract the JSON object from a possibly fenced model answer
    fn parse_decision(raw: &str) -> Result<ReplyDecision> {
        let trimmed = raw.trim();
        let json_slice = match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if end > start => &trimmed[start..=end],
            _ => {
                return Err(Error::Reply(format!(
                    "no JSON object in model answer: {trimmed}"
                )))
            }
        };
        let decision: ReplyDecision = serde_json::from_str(json_slice)
            .map_err(|e| Error::Reply(format!("bad model JSON: {e}")))?;
        if decision.reply.trim().is_empty() {
            return Err(Error::Reply("model returned an empty reply".to_string()));
        }
        Ok(decision)
    }

    pub async fn decide(&self, user_text: &str) -> Result<ReplyDecision> {
        let result = self
            .backend
            .generate(&Self::prompt(user_text))
            .await
            .map_err(|e| Error::Reply(e.to_string()))?;
        Self::parse_decision(&result.text)
    }
}

/// Reply selection facade: generative first when enabled, rules always
pub struct CustomerService {
    generative: Option<GenerativeReplier>,
    rules: RuleReplySelector,
}

impl CustomerService {
    pub fn new(config: &ReplyConfig) -> Self {
        let generative = if config.generative {
            GenerativeReplier::from_config(config)
        } else {
            None
        };
        Self {
            generative,
            rules: RuleReplySelector::new(),
        }
    }

    /// Rules-only selector
    pub fn rules_only() -> Self {
        Self {
            generative: None,
            rules: RuleReplySelector::new(),
        }
    }

    /// Selector with an injected generative path (tests)
    pub fn with_generative(replier: GenerativeReplier) -> Self {
        Self {
            generative: Some(replier),
            rules: RuleReplySelector::new(),
        }
    }
}

#[async_trait]
impl ReplySelector for CustomerService {
    async fn decide(&self, user_text: &str) -> Result<ReplyDecision> {
        if let Some(generative) = &self.generative {
            match generative.decide(user_text).await {
                Ok(decision) => {
                    tracing::info!(action = %decision.action, "generative reply selected");
                    return Ok(decision);
                }
                Err(e) => {
                    tracing::warn!("generative reply failed: {e}; falling back to rule table");
                }
            }
        }

        let decision = self.rules.select(user_text);
        tracing::info!(action = %decision.action, "scripted reply selected");
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsim_llm::{GenerationResult, LlmError};

    #[test]
    fn test_cancel_request_verifies_identity() {
        let rules = RuleReplySelector::new();
        let decision = rules.select("אני רוצה לבטל את המנוי");
        assert_eq!(decision.action, CsAction::Verify);
    }

    #[test]
    fn test_how_question_explains() {
        let rules = RuleReplySelector::new();
        let decision = rules.select("איך זה עובד אצלכם?");
        assert_eq!(decision.action, CsAction::Explain);
    }

    #[test]
    fn test_done_phrasing_confirms() {
        let rules = RuleReplySelector::new();
        let decision = rules.select("סיימתם את התהליך?");
        assert_eq!(decision.action, CsAction::Confirm);
    }

    #[test]
    fn test_goodbye_closes() {
        let rules = RuleReplySelector::new();
        let decision = rules.select("תודה רבה, להתראות");
        assert_eq!(decision.action, CsAction::Close);
    }

    #[test]
    fn test_default_rule_applies() {
        let rules = RuleReplySelector::new();
        let decision = rules.select("משפט שלא תואם כלום");
        assert_eq!(decision.action, CsAction::Explain);
        assert_eq!(decision.reply, "האם ברצונך שאבצע את הביטול כעת?");
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        let rules = RuleReplySelector::new();
        // Contains both cancel and confirmation keywords; the cancel rule
        // is ranked first.
        let decision = rules.select("רוצה לבטל ולקבל אישור במייל");
        assert_eq!(decision.action, CsAction::Verify);
        assert!(decision.reply.contains("תעודת הזהות"));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let rules = RuleReplySelector::new();
        let a = rules.select("בוצע?");
        let b = rules.select("בוצע?");
        assert_eq!(a.reply, b.reply);
        assert_eq!(a.action, b.action);
    }

    #[test]
    fn test_parse_decision_plain_and_fenced() {
        let plain = r#"{"reply": "בסדר", "action": "confirm"}"#;
        let decision = GenerativeReplier::parse_decision(plain).unwrap();
        assert_eq!(decision.action, CsAction::Confirm);

        let fenced = "```json\n{\"reply\": \"שלום\", \"action\": \"close\"}\n```";
        let decision = GenerativeReplier::parse_decision(fenced).unwrap();
        assert_eq!(decision.action, CsAction::Close);
    }

    #[test]
    fn test_parse_decision_rejects_garbage() {
        assert!(GenerativeReplier::parse_decision("sorry, no json here").is_err());
        assert!(GenerativeReplier::parse_decision(r#"{"reply": "", "action": "close"}"#).is_err());
    }

    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn generate(&self, _messages: &[Message]) -> std::result::Result<GenerationResult, LlmError> {
            Err(LlmError::Api("401 unauthorized".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_generative_failure_falls_back_to_rules() {
        let service =
            CustomerService::with_generative(GenerativeReplier::new(Box::new(FailingBackend)));
        let decision = service.decide("אני רוצה לבטל את המנוי").await.unwrap();
        assert_eq!(decision.action, CsAction::Verify);
    }

    struct CannedBackend(&'static str);

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn generate(&self, _messages: &[Message]) -> std::result::Result<GenerationResult, LlmError> {
            Ok(GenerationResult {
                text: self.0.to_string(),
                total_time_ms: 1,
            })
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_generative_success_wins_over_rules() {
        let service = CustomerService::with_generative(GenerativeReplier::new(Box::new(
            CannedBackend(r#"{"reply": "נסגר", "action": "close"}"#),
        )));
        let decision = service.decide("אני רוצה לבטל את המנוי").await.unwrap();
        assert_eq!(decision.action, CsAction::Close);
    }

    #[tokio::test]
    async fn test_generative_parse_error_falls_back() {
        let service = CustomerService::with_generative(GenerativeReplier::new(Box::new(
            CannedBackend("not json at all"),
        )));
        let decision = service.decide("אני רוצה לבטל את המנוי").await.unwrap();
        assert_eq!(decision.action, CsAction::Verify);
    }
}
