//! Task classification
//!
//! Primary path forwards the prompt to the completion API with a fixed
//! system instruction; on failure an ordered keyword fallback takes over.
//! Classification is total: it always yields a label.

use crate::llm::{complete_with_retry, ChatMessage, ChatService, RetryPolicy};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// The 8 fixed task categories
pub const CATEGORIES: [&str; 8] = [
    "Writing / Content Creation",
    "Coding / Development",
    "Instruction / Learning",
    "Research / Information Retrieval",
    "Creative Generation",
    "Conversation / Chat",
    "Data Analysis",
    "Multimodal (Image / Audio) Tasks",
];

pub const DEFAULT_CATEGORY: &str = "Writing / Content Creation";

/// Label returned when the upstream call succeeds but yields no content
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Ordered keyword rules; the first match wins.
static FALLBACK_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\b(code|script|program)\b", "Coding / Development"),
        (r"\b(summarize|write|create)\b", "Writing / Content Creation"),
        (r"\b(learn|teach|explain)\b", "Instruction / Learning"),
        (
            r"\b(research|what is|information)\b",
            "Research / Information Retrieval",
        ),
        (r"\b(generate|creative|design)\b", "Creative Generation"),
        (r"\b(chat|talk|converse)\b", "Conversation / Chat"),
        (r"\b(data|analy(s|z)e)\b", "Data Analysis"),
        (
            r"\b(image|photo|audio|video)\b",
            "Multimodal (Image / Audio) Tasks",
        ),
    ]
    .into_iter()
    .map(|(pattern, category)| (Regex::new(pattern).expect("static regex"), category))
    .collect()
});

/// Keyword fallback. Cannot fail: unmatched input gets the default label.
pub fn fallback_classify(prompt: &str) -> &'static str {
    let lowered = prompt.to_lowercase();
    for (pattern, category) in &*FALLBACK_RULES {
        if pattern.is_match(&lowered) {
            return *category;
        }
    }
    DEFAULT_CATEGORY
}

/// System instruction for the upstream classification call.
pub fn system_prompt() -> String {
    let numbered = CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, category)| format!("{}. {category}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a task classification assistant. Your job is to read a user's \
         prompt and assign it one of these 8 categories only:\n\n{numbered}\n\n\
         Return ONLY the name of the matching category. Do not explain your reasoning."
    )
}

/// Classifier over an optional upstream service
pub struct Classifier {
    service: Option<Arc<dyn ChatService>>,
    policy: RetryPolicy,
}

impl Classifier {
    pub fn new(service: Option<Arc<dyn ChatService>>) -> Self {
        Self {
            service,
            policy: RetryPolicy::default(),
        }
    }

    #[cfg(test)]
    pub fn with_policy(service: Option<Arc<dyn ChatService>>, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    /// Classify a prompt.
    ///
    /// Returns the upstream label when the call succeeds ("Unknown" if the
    /// upstream content is empty), the keyword fallback when it does not.
    pub async fn classify(&self, prompt: &str) -> String {
        if let Some(service) = &self.service {
            let messages = [
                ChatMessage::system(system_prompt()),
                ChatMessage::user(prompt),
            ];
            match complete_with_retry(service.as_ref(), &messages, &self.policy).await {
                Ok(content) => {
                    let label = content.trim();
                    if label.is_empty() {
                        return UNKNOWN_CATEGORY.to_string();
                    }
                    return label.to_string();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "classifier upstream unavailable, falling back");
                }
            }
        }
        fallback_classify(prompt).to_string()
    }
}
