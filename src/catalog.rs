//! Static recommendation catalogs
//!
//! Two JSON resources feed the recommendation cards: an LLM catalog and a
//! general-tool catalog. Both are loaded once at startup and sliced by a
//! per-session offset; requesting past the end yields an empty batch,
//! never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// Number of entries returned per "show more" request
pub const PAGE_SIZE: usize = 3;

pub const LLM_CATALOG_FILE: &str = "llmscl.json";
pub const TOOL_CATALOG_FILE: &str = "tools.json";

/// An entry in the LLM catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRecord {
    pub title: String,
    pub link: String,
    pub description: String,
    pub task_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An entry in the general-tool catalog
///
/// The source data carries a numeric popularity field that sometimes holds
/// a literal `NaN` token; [`sanitize_catalog_json`] rewrites those to
/// `null` before parsing, so the field is optional here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub name: String,
    pub description: String,
    pub link: String,
    pub task_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

/// Keywords matched against LLM catalog entries for each category.
fn category_keywords(category: &str) -> &'static [&'static str] {
    match category {
        "Writing / Content Creation" => &["content generation", "text", "writing"],
        "Coding / Development" => &["code", "development", "programming"],
        "Instruction / Learning" => &["education", "instruction", "teaching", "learning"],
        "Research / Information Retrieval" => &["research", "qa", "retrieval", "knowledge"],
        "Creative Generation" => &["creative", "generation", "imagination"],
        "Conversation / Chat" => &["chat", "dialogue", "conversation", "natural conversation"],
        "Data Analysis" => &["data", "analytics", "analysis"],
        "Multimodal (Image / Audio) Tasks" => &["multimodal", "image", "audio", "vision"],
        _ => &[],
    }
}

/// Decompose a category label into lowercase keyword fragments for the
/// tool catalog's looser substring matching.
fn category_fragments(category: &str) -> Vec<String> {
    category
        .split(|c: char| !c.is_alphanumeric())
        .filter(|f| f.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

static NAN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bNaN\b").expect("static regex"));

/// Rewrite literal `NaN` placeholder tokens to `null` so the raw text is
/// valid JSON.
pub fn sanitize_catalog_json(raw: &str) -> String {
    NAN_TOKEN.replace_all(raw, "null").into_owned()
}

/// In-memory catalogs, loaded once per process
#[derive(Debug, Default)]
pub struct Catalog {
    llms: Vec<LlmRecord>,
    tools: Vec<ToolRecord>,
}

impl Catalog {
    /// Load both catalogs from a data directory.
    ///
    /// A read or parse failure degrades that catalog to an empty list;
    /// recommendation flows then produce empty batches instead of failing
    /// the conversation.
    pub fn load(dir: &Path) -> Self {
        let llms = match load_records::<LlmRecord>(&dir.join(LLM_CATALOG_FILE), false) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, file = LLM_CATALOG_FILE, "failed to load LLM catalog");
                Vec::new()
            }
        };

        let tools = match load_records::<ToolRecord>(&dir.join(TOOL_CATALOG_FILE), true) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, file = TOOL_CATALOG_FILE, "failed to load tool catalog");
                Vec::new()
            }
        };

        tracing::info!(llms = llms.len(), tools = tools.len(), "catalogs loaded");
        Self { llms, tools }
    }

    pub fn from_records(llms: Vec<LlmRecord>, tools: Vec<ToolRecord>) -> Self {
        Self { llms, tools }
    }

    /// Slice of LLM entries matching a category, `[offset, offset + PAGE_SIZE)`.
    pub fn llm_page(&self, category: &str, offset: usize) -> Vec<LlmRecord> {
        let keywords = category_keywords(category);
        if keywords.is_empty() {
            tracing::warn!(category, "no keyword mapping for category");
        }
        let matches = self.llms.iter().filter(|llm| {
            keywords.iter().any(|kw| {
                llm.task_type.to_lowercase().contains(kw)
                    || llm.tags.iter().any(|tag| tag.to_lowercase().contains(kw))
            })
        });
        matches.skip(offset).take(PAGE_SIZE).cloned().collect()
    }

    /// Slice of tool entries matching a category, same offset rule but a
    /// separate cursor per catalog.
    pub fn tool_page(&self, category: &str, offset: usize) -> Vec<ToolRecord> {
        let fragments = category_fragments(category);
        let matches = self.tools.iter().filter(|tool| {
            fragments.iter().any(|frag| {
                tool.task_type.to_lowercase().contains(frag)
                    || tool.tags.iter().any(|tag| tag.to_lowercase().contains(frag))
            })
        });
        matches.skip(offset).take(PAGE_SIZE).cloned().collect()
    }
}

fn load_records<T: serde::de::DeserializeOwned>(
    path: &Path,
    sanitize: bool,
) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let raw = if sanitize {
        sanitize_catalog_json(&raw)
    } else {
        raw
    };
    Ok(serde_json::from_str(&raw)?)
}
