use std::fmt::Write as _;

use reqwest::Client;

use study_core::model::QuestionDraft;

use super::{AiGatewayConfig, chat_complete, ladder, strip_code_fence};
use crate::error::GatewayError;

/// Fixed instruction sent with every extraction request.
const EXTRACTION_PROMPT: &str = "\
You are an expert professor creating high-quality exam material.
Analyze the attached course documents and produce a structured JSON list.

Identify the key concepts and create:
- \"type\": \"flashcard\" (key concepts), \"quiz\" (4-option test) or \"essay\" (development question).
- \"question\": the clear, precise question.
- \"answer\": the complete correct answer.
- \"options\": (ONLY for type=\"quiz\") an array of exactly 4 strings.

Generate a good amount of varied questions at a high complexity level
(at least 5 flashcards, 5 quiz, 3 essay).

Expected JSON format:
[
  {\"type\": \"flashcard\", \"question\": \"...\", \"answer\": \"...\"},
  {\"type\": \"quiz\", \"question\": \"...\", \"options\": [\"A\", \"B\", \"C\", \"D\"], \"answer\": \"Correct option\"},
  {\"type\": \"essay\", \"question\": \"...\", \"answer\": \"Detailed explanation...\"}
]
Respond with the JSON array only.";

/// How many existing prompts are passed as context when generating more
/// questions for a topic.
const TOPIC_CONTEXT_LIMIT: usize = 5;

/// One uploaded course document, ready to be sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Requested per-kind amounts for topic-scoped generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationCounts {
    pub flashcards: u32,
    pub quiz: u32,
    pub essays: u32,
}

impl GenerationCounts {
    #[must_use]
    pub fn new(flashcards: u32, quiz: u32, essays: u32) -> Self {
        Self {
            flashcards,
            quiz,
            essays,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.flashcards + self.quiz + self.essays
    }
}

/// Turns uploaded documents into candidate questions via the model ladder.
#[derive(Clone)]
pub struct ExtractionGateway {
    client: Client,
    config: Option<AiGatewayConfig>,
}

impl ExtractionGateway {
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

    /// Extract candidate questions from the given documents.
    ///
    /// A malformed or empty model response yields an empty list, never a
    /// partial parse.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Disabled` without configuration, or
    /// `GatewayError::Exhausted` when every candidate model failed.
    pub async fn extract_questions(
        &self,
        documents: &[SourceDocument],
    ) -> Result<Vec<QuestionDraft>, GatewayError> {
        let config = self.config.as_ref().ok_or(GatewayError::Disabled)?;
        let prompt = build_extraction_prompt(documents);

        let text = ladder::run(&config.models, config.retry_delay, |model| {
            let prompt = prompt.clone();
            async move { chat_complete(&self.client, config, &model, &prompt).await }
        })
        .await?;

        Ok(parse_drafts(&text))
    }

    /// Generate additional questions for an existing topic.
    ///
    /// A handful of existing prompts are included as context so the model
    /// avoids duplicating stored questions.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Disabled` without configuration, or
    /// `GatewayError::Exhausted` when every candidate model failed.
    pub async fn generate_for_topic(
        &self,
        topic: &str,
        counts: GenerationCounts,
        existing_prompts: &[String],
    ) -> Result<Vec<QuestionDraft>, GatewayError> {
        let config = self.config.as_ref().ok_or(GatewayError::Disabled)?;
        let prompt = build_topic_prompt(topic, counts, existing_prompts);

        let text = ladder::run(&config.models, config.retry_delay, |model| {
            let prompt = prompt.clone();
            async move { chat_complete(&self.client, config, &model, &prompt).await }
        })
        .await?;

        Ok(parse_drafts(&text))
    }
}

fn build_extraction_prompt(documents: &[SourceDocument]) -> String {
    let mut prompt = String::from(EXTRACTION_PROMPT);
    for doc in documents {
        let _ = write!(prompt, "\n\n--- Document: {} ---\n{}", doc.name, doc.text);
    }
    prompt
}

fn build_topic_prompt(topic: &str, counts: GenerationCounts, existing: &[String]) -> String {
    let context = existing
        .iter()
        .take(TOPIC_CONTEXT_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Topic: {topic}\n\
         Existing questions (context):\n{context}\n\n\
         Generate EXACTLY {total} NEW and DIFFERENT questions distributed as:\n\
         - {flashcards} of type 'flashcard' (short question/answer)\n\
         - {quiz} of type 'quiz' (4-option test with the correct answer)\n\
         - {essays} of type 'essay' (open development question)\n\n\
         Strict JSON format:\n\
         [\n\
           {{\"type\": \"flashcard\", \"question\": \"...\", \"answer\": \"...\"}},\n\
           {{\"type\": \"quiz\", \"question\": \"...\", \"options\": [\"A\", \"B\", \"C\", \"D\"], \"answer\": \"Correct option\"}},\n\
           {{\"type\": \"essay\", \"question\": \"...\", \"answer\": \"Expected explanation...\"}}\n\
         ]\n\
         Respond with the JSON array only.",
        total = counts.total(),
        flashcards = counts.flashcards,
        quiz = counts.quiz,
        essays = counts.essays,
    )
}

/// Parse the model output into drafts.
///
/// Anything that does not parse as a JSON array of drafts counts as "no
/// questions produced" — partial output is never salvaged.
fn parse_drafts(raw: &str) -> Vec<QuestionDraft> {
    serde_json::from_str(strip_code_fence(raw)).unwrap_or_default()
}
