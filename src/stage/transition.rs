//! Pure stage transition function
//!
//! Given the same session and event this always produces the same next
//! session and effects, with no I/O. Events that make no sense in the
//! current stage (stale button clicks, double submissions) are ignored
//! without a state change.

use super::{CardAction, Effect, Event, Session, Stage};
use crate::db::{MessageContent, Role};

pub const WELCOME: &str = "Hi! I'm Compass. Describe a task and I'll point you at the right \
                           AI tools. Want some recommendations? (yes/no)";
pub const ASK_TASK: &str =
    "Great! Tell me about the task you're working on and I'll suggest some LLMs.";
pub const SWITCH_TO_CHAT: &str = "No problem - feel free to just chat. Ask me anything!";
pub const CLARIFY: &str = "Sorry, I didn't catch that. Please answer \"yes\" or \"no\".";
pub const ASK_PREFERENCES: &str = "What matters most to you - price, speed, accuracy, context \
                                   size? Tell me and I'll compare the options.";
pub const ASK_HUGGINGFACE: &str = "What kind of Hugging Face model are you looking for? \
                                   Describe it and I'll suggest some.";
pub const CLOSING: &str =
    "Happy building! Describe a new task any time, or just keep chatting.";
pub const APOLOGY: &str =
    "⚠️ Sorry, the chat service is currently unavailable. Please try again later.";

/// Result of a stage transition
#[derive(Debug)]
pub struct TransitionResult {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

fn comparison_prompt(category: &str, preferences: &str) -> String {
    format!(
        "The user is choosing between LLM tools for the category \"{category}\". \
         Their preferences: {preferences}. Compare the recommended options against \
         these preferences and suggest the best fit."
    )
}

fn huggingface_prompt(request: &str) -> String {
    format!("Suggest Hugging Face models for the following request: {request}")
}

/// Pure transition function
#[allow(clippy::too_many_lines)] // One arm per table row reads better than dispatch helpers
pub fn transition(session: &Session, event: Event) -> TransitionResult {
    let mut next = session.clone();

    match (session.stage, event) {
        // ============================================================
        // Onboarding and start confirmation
        // ============================================================
        (Stage::Onboarding, Event::Opened) => {
            next.stage = Stage::AwaitStartConfirm;
            TransitionResult::new(next).with_effect(Effect::say(WELCOME))
        }

        (Stage::AwaitStartConfirm, Event::UserText(text)) => {
            let reply = text.trim().to_string();
            let mut effects = vec![Effect::echo_user(text)];
            if reply.eq_ignore_ascii_case("yes") {
                next.stage = Stage::AwaitTaskPrompt;
                effects.push(Effect::say(ASK_TASK));
            } else if reply.eq_ignore_ascii_case("no") {
                next.stage = Stage::Idle;
                effects.push(Effect::say(SWITCH_TO_CHAT));
            } else {
                // Re-prompt without advancing; no retry cap
                effects.push(Effect::say(CLARIFY));
            }
            TransitionResult {
                session: next,
                effects,
            }
        }

        // ============================================================
        // Task prompt and classification
        // ============================================================
        (Stage::AwaitTaskPrompt, Event::UserText(text)) => {
            next.stage = Stage::AwaitLlmAction;
            // New task: offsets and cached category reset
            next.category = None;
            next.llm_offset = 0;
            next.tool_offset = 0;
            TransitionResult::new(next)
                .with_effect(Effect::echo_user(text.clone()))
                .with_effect(Effect::Classify { prompt: text })
        }

        (Stage::AwaitLlmAction, Event::Classified { category }) => {
            next.category = Some(category.clone());
            TransitionResult::new(next).with_effect(Effect::FetchLlmBatch {
                category,
                offset: session.llm_offset,
            })
        }

        (Stage::AwaitLlmAction, Event::LlmBatch { models }) => {
            next.llm_offset += models.len();
            if models.is_empty() {
                // Past the end of the catalog: suppress the card entirely
                TransitionResult::new(next)
            } else {
                let category = session.category.clone().unwrap_or_default();
                TransitionResult::new(next).with_effect(Effect::Append {
                    role: Role::Ai,
                    content: MessageContent::LlmSuggestions { category, models },
                })
            }
        }

        // ============================================================
        // Recommendation card actions
        // ============================================================
        (Stage::AwaitLlmAction, Event::Action(CardAction::ShowMore)) => {
            match &session.category {
                Some(category) => TransitionResult::new(next).with_effect(Effect::FetchLlmBatch {
                    category: category.clone(),
                    offset: session.llm_offset,
                }),
                None => TransitionResult::new(next),
            }
        }

        (Stage::AwaitLlmAction, Event::Action(CardAction::Preferences)) => {
            next.stage = Stage::AwaitLlmPreferences;
            TransitionResult::new(next).with_effect(Effect::say(ASK_PREFERENCES))
        }

        (Stage::AwaitLlmAction, Event::Action(CardAction::Tools)) => match &session.category {
            Some(category) => {
                next.stage = Stage::AwaitToolAction;
                TransitionResult::new(next).with_effect(Effect::FetchToolBatch {
                    category: category.clone(),
                    offset: session.tool_offset,
                })
            }
            None => TransitionResult::new(next),
        },

        (Stage::AwaitLlmAction | Stage::AwaitToolAction, Event::Action(CardAction::Done)) => {
            next.stage = Stage::Idle;
            TransitionResult::new(next).with_effect(Effect::say(CLOSING))
        }

        // ============================================================
        // Preferences sub-flow
        // ============================================================
        (Stage::AwaitLlmPreferences, Event::UserText(text)) => {
            next.stage = Stage::AwaitLlmAction;
            let category = session.category.clone().unwrap_or_default();
            TransitionResult::new(next)
                .with_effect(Effect::echo_user(text.clone()))
                .with_effect(Effect::RelayPrompt {
                    prompt: comparison_prompt(&category, &text),
                })
        }

        // ============================================================
        // Tools sub-flow
        // ============================================================
        (Stage::AwaitToolAction, Event::ToolBatch { tools }) => {
            next.tool_offset += tools.len();
            if tools.is_empty() {
                TransitionResult::new(next)
            } else {
                let category = session.category.clone().unwrap_or_default();
                TransitionResult::new(next).with_effect(Effect::Append {
                    role: Role::Ai,
                    content: MessageContent::ToolSuggestions { category, tools },
                })
            }
        }

        (Stage::AwaitToolAction, Event::Action(CardAction::MoreTools)) => {
            match &session.category {
                Some(category) => TransitionResult::new(next).with_effect(Effect::FetchToolBatch {
                    category: category.clone(),
                    offset: session.tool_offset,
                }),
                None => TransitionResult::new(next),
            }
        }

        (Stage::AwaitToolAction, Event::Action(CardAction::Huggingface)) => {
            next.stage = Stage::AwaitHuggingfacePrompt;
            TransitionResult::new(next).with_effect(Effect::say(ASK_HUGGINGFACE))
        }

        (Stage::AwaitHuggingfacePrompt, Event::UserText(text)) => {
            next.stage = Stage::AwaitToolAction;
            TransitionResult::new(next)
                .with_effect(Effect::echo_user(text.clone()))
                .with_effect(Effect::RelayPrompt {
                    prompt: huggingface_prompt(&text),
                })
        }

        // ============================================================
        // Idle chat
        // ============================================================
        (Stage::Idle, Event::UserText(text)) => TransitionResult::new(next)
            .with_effect(Effect::echo_user(text))
            .with_effect(Effect::RelayHistory),

        // ============================================================
        // Relay completions (valid wherever a relay was requested)
        // ============================================================
        (_, Event::ChatReply { text }) => {
            TransitionResult::new(next).with_effect(Effect::say(text))
        }

        (_, Event::ChatFailed) => TransitionResult::new(next).with_effect(Effect::say(APOLOGY)),

        // Everything else is a stale or out-of-place event
        _ => TransitionResult::new(next),
    }
}
