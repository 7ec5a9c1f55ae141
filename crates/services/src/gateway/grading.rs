use reqwest::Client;
use serde::Deserialize;

use super::{AiGatewayConfig, chat_complete, ladder, strip_code_fence};
use crate::error::GatewayError;

/// Feedback recorded when the model's verdict cannot be parsed.
const GRADING_ERROR_FEEDBACK: &str = "grading error";

/// Verdict returned by the grading gateway, recorded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EssayVerdict {
    pub correct: bool,
    pub feedback: String,
}

impl EssayVerdict {
    /// Verdict used when the model response is not parseable.
    #[must_use]
    pub fn grading_error() -> Self {
        Self {
            correct: false,
            feedback: GRADING_ERROR_FEEDBACK.to_string(),
        }
    }
}

/// Grades free-text answers against a reference answer via the model ladder.
#[derive(Clone)]
pub struct GradingGateway {
    client: Client,
    config: Option<AiGatewayConfig>,
}

impl GradingGateway {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(AiGatewayConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<AiGatewayConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Grade a user's essay answer.
    ///
    /// A response that does not parse as `{"correct": bool, "feedback":
    /// string}` becomes the default incorrect verdict rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Disabled` without configuration, or
    /// `GatewayError::Exhausted` when every candidate model failed.
    pub async fn grade_essay(
        &self,
        question: &str,
        reference_answer: &str,
        user_answer: &str,
    ) -> Result<EssayVerdict, GatewayError> {
        let config = self.config.as_ref().ok_or(GatewayError::Disabled)?;
        let prompt = build_grading_prompt(question, reference_answer, user_answer);

        let text = ladder::run(&config.models, config.retry_delay, |model| {
            let prompt = prompt.clone();
            async move { chat_complete(&self.client, config, &model, &prompt).await }
        })
        .await?;

        Ok(parse_verdict(&text))
    }
}

fn build_grading_prompt(question: &str, reference_answer: &str, user_answer: &str) -> String {
    format!(
        "Evaluate this answer.\n\
         Question: {question}\n\
         Reference answer: {reference_answer}\n\
         Student answer: {user_answer}\n\
         Respond with JSON only: {{\"correct\": bool, \"feedback\": string}}"
    )
}

fn parse_verdict(raw: &str) -> EssayVerdict {
    serde_json::from_str(strip_code_fence(raw)).unwrap_or_else(|_| EssayVerdict::grading_error())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_verdict_reads_well_formed_json() {
        let verdict = parse_verdict(r#"{"correct": true, "feedback": "Well argued."}"#);
        assert!(verdict.correct);
        assert_eq!(verdict.feedback, "Well argued.");
    }

    #[test]
    fn parse_verdict_accepts_fenced_output() {
        let verdict =
            parse_verdict("```json\n{\"correct\": false, \"feedback\": \"Missing X.\"}\n```");
        assert!(!verdict.correct);
    }

    #[test]
    fn unparseable_verdict_defaults_to_grading_error() {
        let verdict = parse_verdict("the student did great");
        assert!(!verdict.correct);
        assert_eq!(verdict.feedback, GRADING_ERROR_FEEDBACK);
    }

    #[test]
    fn grading_prompt_contains_all_three_texts() {
        let prompt = build_grading_prompt("Q?", "Ref.", "Mine.");
        assert!(prompt.contains("Q?"));
        assert!(prompt.contains("Ref."));
        assert!(prompt.contains("Mine."));
    }
}
