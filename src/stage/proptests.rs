//! Property-based tests for the stage machine
//!
//! These verify key invariants hold across all possible inputs.

use super::state::{Session, Stage};
use super::transition::transition;
use super::{CardAction, Effect, Event};
use crate::catalog::LlmRecord;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::Onboarding),
        Just(Stage::AwaitStartConfirm),
        Just(Stage::AwaitTaskPrompt),
        Just(Stage::AwaitLlmPreferences),
        Just(Stage::AwaitLlmAction),
        Just(Stage::AwaitToolAction),
        Just(Stage::AwaitHuggingfacePrompt),
        Just(Stage::Idle),
    ]
}

fn arb_session() -> impl Strategy<Value = Session> {
    (
        arb_stage(),
        proptest::option::of("[A-Za-z /]{1,30}"),
        0usize..20,
        0usize..20,
    )
        .prop_map(|(stage, category, llm_offset, tool_offset)| Session {
            stage,
            category,
            llm_offset,
            tool_offset,
        })
}

fn arb_action() -> impl Strategy<Value = CardAction> {
    prop_oneof![
        Just(CardAction::ShowMore),
        Just(CardAction::Preferences),
        Just(CardAction::Tools),
        Just(CardAction::MoreTools),
        Just(CardAction::Huggingface),
        Just(CardAction::Done),
    ]
}

fn arb_models(max: usize) -> impl Strategy<Value = Vec<LlmRecord>> {
    proptest::collection::vec("[a-z]{1,10}", 0..=max).prop_map(|titles| {
        titles
            .into_iter()
            .map(|title| LlmRecord {
                title,
                link: String::new(),
                description: String::new(),
                task_type: String::new(),
                tags: vec![],
            })
            .collect()
    })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Opened),
        ".{0,40}".prop_map(Event::UserText),
        arb_action().prop_map(Event::Action),
        "[A-Za-z /]{1,30}".prop_map(|category| Event::Classified { category }),
        arb_models(3).prop_map(|models| Event::LlmBatch { models }),
        Just(Event::ToolBatch { tools: vec![] }),
        ".{0,40}".prop_map(|text| Event::ChatReply { text }),
        Just(Event::ChatFailed),
    ]
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    /// Offsets never regress, except for the documented reset on a new
    /// task prompt.
    #[test]
    fn offsets_are_monotonic_outside_task_reset(
        session in arb_session(),
        event in arb_event(),
    ) {
        let is_task_reset =
            session.stage == Stage::AwaitTaskPrompt && matches!(event, Event::UserText(_));
        let result = transition(&session, event);

        if is_task_reset {
            prop_assert_eq!(result.session.llm_offset, 0);
            prop_assert_eq!(result.session.tool_offset, 0);
        } else {
            prop_assert!(result.session.llm_offset >= session.llm_offset);
            prop_assert!(result.session.tool_offset >= session.tool_offset);
        }
    }

    /// The machine never panics and always lands on exactly one stage.
    #[test]
    fn transition_is_total(session in arb_session(), event in arb_event()) {
        let _ = transition(&session, event);
    }

    /// Any single event emits at most two messages (a user echo plus one
    /// assistant reply).
    #[test]
    fn at_most_two_messages_per_event(session in arb_session(), event in arb_event()) {
        let result = transition(&session, event);
        let appends = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::Append { .. }))
            .count();
        prop_assert!(appends <= 2);
    }

    /// Confirmation input either advances to the task prompt, drops to
    /// idle, or stays put - nothing else.
    #[test]
    fn confirmation_only_reaches_known_stages(text in ".{0,40}") {
        let session = Session {
            stage: Stage::AwaitStartConfirm,
            ..Session::default()
        };
        let result = transition(&session, Event::UserText(text.clone()));
        let expected = if text.trim().eq_ignore_ascii_case("yes") {
            Stage::AwaitTaskPrompt
        } else if text.trim().eq_ignore_ascii_case("no") {
            Stage::Idle
        } else {
            Stage::AwaitStartConfirm
        };
        prop_assert_eq!(result.session.stage, expected);
    }

    /// A fetched batch advances the LLM cursor by exactly the batch size.
    #[test]
    fn llm_cursor_advances_by_batch_len(models in arb_models(3), offset in 0usize..20) {
        let session = Session {
            stage: Stage::AwaitLlmAction,
            category: Some("Writing / Content Creation".to_string()),
            llm_offset: offset,
            tool_offset: 0,
        };
        let len = models.len();
        let result = transition(&session, Event::LlmBatch { models });
        prop_assert_eq!(result.session.llm_offset, offset + len);
    }

    /// Effect-producing I/O never happens in the pure core: fetch effects
    /// always carry the session's own cursor.
    #[test]
    fn show_more_uses_current_cursor(offset in 0usize..50) {
        let session = Session {
            stage: Stage::AwaitLlmAction,
            category: Some("Data Analysis".to_string()),
            llm_offset: offset,
            tool_offset: 0,
        };
        let result = transition(&session, Event::Action(CardAction::ShowMore));
        prop_assert_eq!(
            result.effects,
            vec![Effect::FetchLlmBatch {
                category: "Data Analysis".to_string(),
                offset
            }]
        );
    }
}
