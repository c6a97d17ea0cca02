//! Bounded tool-calling loop between a model and the household.
//!
//! Each turn the [`Assistant`] either replies to the user or asks for a batch
//! of tool calls. Calls run one at a time through the command layer and their
//! results become the next turn's input. The loop ends at the first reply or
//! after `max_turns`.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::agent::recommendation::RecommendationBoard;
use crate::agent::tools::{self, ToolCall, ToolSpec};
use crate::config::MAX_AGENT_TURNS;
use crate::error::{FamSyncError, FamSyncResult};
use crate::event::DEFAULT_EVENT_MINUTES;
use crate::household::Household;
use crate::time::{self, Instant};

/// What the model produced for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelTurn {
    Calls {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<String>,
        calls: Vec<ToolCall>,
    },
    Reply {
        reply: String,
    },
}

/// Result of one tool call as fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub name: String,
    pub result: Value,
}

/// Input handed to the model for a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnInput {
    UserMessage { text: String },
    ToolResults { results: Vec<ToolResponse> },
}

/// Instructions and tools available to the model this turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentContext {
    pub system_prompt: String,
    pub tools: Vec<ToolSpec>,
}

/// The language model side of the loop.
#[async_trait]
pub trait Assistant: Send {
    async fn respond(&mut self, context: &AgentContext, input: &TurnInput) -> FamSyncResult<ModelTurn>;
}

/// One executed tool call, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolLog {
    pub name: String,
    pub args: Value,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_logs: Vec<ToolLog>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Replied,
    TurnLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub reply: Option<String>,
    pub turns: usize,
    pub stop: StopReason,
}

/// Conversation state: the household as the agent has changed it, pending
/// recommendations and the transcript.
#[derive(Debug, Clone)]
pub struct AgentSession {
    pub household: Household,
    pub board: RecommendationBoard,
    pub transcript: Vec<TurnRecord>,
    now: Instant,
    event_length: Duration,
    max_turns: usize,
    requests: usize,
}

impl AgentSession {
    pub fn new(household: Household, now: Instant) -> Self {
        AgentSession {
            household,
            board: RecommendationBoard::default(),
            transcript: Vec::new(),
            now,
            event_length: Duration::minutes(DEFAULT_EVENT_MINUTES),
            max_turns: MAX_AGENT_TURNS,
            requests: 0,
        }
    }

    /// Cap model turns per request, within `1..=MAX_AGENT_TURNS`.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.clamp(1, MAX_AGENT_TURNS);
        self
    }

    /// Length of events the agent adds without an end.
    pub fn with_event_length(mut self, event_length: Duration) -> Self {
        self.event_length = event_length;
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn event_length(&self) -> Duration {
        self.event_length
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn context(&self) -> AgentContext {
        AgentContext {
            system_prompt: system_prompt(&self.household, self.now),
            tools: tools::catalog(),
        }
    }

    /// Handle one user message.
    ///
    /// Changes made by tool calls stay in the session even if the assistant
    /// fails part way through.
    pub async fn run(&mut self, assistant: &mut dyn Assistant, message: &str) -> FamSyncResult<RunOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(FamSyncError::Validation("Message is empty".into()));
        }

        self.requests += 1;
        let request = self.requests;
        let mut input = TurnInput::UserMessage {
            text: message.to_string(),
        };

        for turn in 1..=self.max_turns {
            let turn_id = format!("{request}_turn_{turn}");
            let context = self.context();
            let model_turn = assistant.respond(&context, &input).await?;

            let (thought, calls) = match model_turn {
                ModelTurn::Reply { reply } => return Ok(self.finish(turn_id, reply, turn)),
                ModelTurn::Calls { thought, calls } if calls.is_empty() => {
                    let reply = thought.unwrap_or_default();
                    return Ok(self.finish(turn_id, reply, turn));
                }
                ModelTurn::Calls { thought, calls } => (thought, calls),
            };

            tracing::debug!(turn = %turn_id, calls = calls.len(), "running tool calls");

            let mut tool_logs = Vec::with_capacity(calls.len());
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                let outcome = tools::execute(
                    &self.household,
                    &call,
                    self.now,
                    self.event_length,
                    &turn_id,
                    &mut self.board,
                );
                self.household = outcome.household;

                results.push(ToolResponse {
                    name: call.name.clone(),
                    result: outcome.result.clone(),
                });
                tool_logs.push(ToolLog {
                    name: call.name,
                    args: call.args,
                    result: outcome.result,
                });
            }

            self.transcript.push(TurnRecord {
                id: turn_id,
                thought,
                reply: None,
                tool_logs,
            });
            input = TurnInput::ToolResults { results };
        }

        tracing::warn!(max_turns = self.max_turns, "agent stopped at the turn limit");
        Ok(RunOutcome {
            reply: None,
            turns: self.max_turns,
            stop: StopReason::TurnLimit,
        })
    }

    fn finish(&mut self, turn_id: String, reply: String, turn: usize) -> RunOutcome {
        self.transcript.push(TurnRecord {
            id: turn_id,
            thought: None,
            reply: Some(reply.clone()),
            tool_logs: Vec::new(),
        });
        RunOutcome {
            reply: Some(reply),
            turns: turn,
            stop: StopReason::Replied,
        }
    }
}

/// Instructions for a model driving the tools.
pub fn system_prompt(household: &Household, now: Instant) -> String {
    let members: Vec<Value> = household
        .members
        .iter()
        .map(|m| json!({ "id": m.id, "name": m.name }))
        .collect();

    format!(
        "\
You are FamilyBot, the assistant of a shared family calendar and to-do list.
You manage calendar events, to-do tasks and family members through tools.

Rules:
- Never guess an id. Call list_members, list_events or list_tasks to find it.
- You may chain several tool calls before answering.
- Every task must be assigned to at least one family member.
- Use ISO 8601 dates. If a request has no time, ask for one.
- Use display_recommendations to suggest events or tasks the family can add.
- Finish with a short, friendly reply.

Today: {}
Members: {}
",
        time::format_instant(now),
        Value::Array(members)
    )
}

/// Replays a recorded list of turns. Useful offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAssistant {
    turns: VecDeque<ModelTurn>,
    /// Inputs received so far, in order.
    pub inputs: Vec<TurnInput>,
}

impl ScriptedAssistant {
    pub fn new(turns: impl IntoIterator<Item = ModelTurn>) -> Self {
        ScriptedAssistant {
            turns: turns.into_iter().collect(),
            inputs: Vec::new(),
        }
    }

    /// Parse a JSON array of turns, each `{"reply": ...}` or
    /// `{"thought": ..., "calls": [{"name": ..., "args": {...}}]}`.
    pub fn from_json(script: &str) -> FamSyncResult<Self> {
        let turns: Vec<ModelTurn> = serde_json::from_str(script)?;
        Ok(Self::new(turns))
    }

    pub fn remaining(&self) -> usize {
        self.turns.len()
    }
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn respond(&mut self, _context: &AgentContext, input: &TurnInput) -> FamSyncResult<ModelTurn> {
        self.inputs.push(input.clone());
        self.turns
            .pop_front()
            .ok_or_else(|| FamSyncError::Agent("Script has no more turns".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> Instant {
        NaiveDate::from_ymd_opt(2025, 3, 19)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall::new(name, args)
    }

    #[tokio::test]
    async fn reply_ends_the_loop() {
        let mut session = AgentSession::new(Household::default(), now());
        let mut assistant = ScriptedAssistant::new([ModelTurn::Reply {
            reply: "Hi!".to_string(),
        }]);

        let outcome = session.run(&mut assistant, "hello").await.unwrap();
        assert_eq!(outcome.reply.as_deref(), Some("Hi!"));
        assert_eq!(outcome.turns, 1);
        assert_eq!(outcome.stop, StopReason::Replied);
        assert_eq!(session.transcript[0].id, "1_turn_1");
    }

    #[tokio::test]
    async fn tool_results_feed_the_next_turn() {
        let mut session = AgentSession::new(Household::default(), now());
        let mut assistant = ScriptedAssistant::new([
            ModelTurn::Calls {
                thought: Some("Add Mom first.".to_string()),
                calls: vec![call(tools::ADD_MEMBER, json!({ "name": "Mom" }))],
            },
            ModelTurn::Calls {
                thought: None,
                calls: vec![
                    call(tools::LIST_MEMBERS, json!({})),
                    call("nonexistent", json!({})),
                ],
            },
            ModelTurn::Reply {
                reply: "Added Mom.".to_string(),
            },
        ]);

        let outcome = session.run(&mut assistant, "add mom").await.unwrap();
        assert_eq!(outcome.turns, 3);
        assert_eq!(session.household.members.len(), 1);

        let TurnInput::ToolResults { results } = &assistant.inputs[2] else {
            panic!("expected tool results, got {:?}", assistant.inputs[2]);
        };
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].result["members"][0]["name"], "Mom");
        assert!(results[1].result.get("error").is_some());

        let logs = &session.transcript[1].tool_logs;
        assert_eq!(logs[0].name, tools::LIST_MEMBERS);
        assert_eq!(session.transcript[0].thought.as_deref(), Some("Add Mom first."));
    }

    #[tokio::test]
    async fn stops_at_turn_limit() {
        let turns = (0..10).map(|_| ModelTurn::Calls {
            thought: None,
            calls: vec![call(tools::LIST_MEMBERS, json!({}))],
        });
        let mut assistant = ScriptedAssistant::new(turns);
        let mut session = AgentSession::new(Household::default(), now()).with_max_turns(3);

        let outcome = session.run(&mut assistant, "loop forever").await.unwrap();
        assert_eq!(outcome.stop, StopReason::TurnLimit);
        assert_eq!(outcome.turns, 3);
        assert_eq!(assistant.remaining(), 7);
    }

    #[tokio::test]
    async fn max_turns_is_clamped() {
        let session = AgentSession::new(Household::default(), now()).with_max_turns(50);
        assert_eq!(session.max_turns(), MAX_AGENT_TURNS);
        let session = session.with_max_turns(0);
        assert_eq!(session.max_turns(), 1);
    }

    #[tokio::test]
    async fn added_events_last_the_session_length() {
        let h = Household::default().add_member("Mom", None).unwrap().household;
        let mom = h.members[0].id.clone();
        let mut session = AgentSession::new(h, now()).with_event_length(Duration::minutes(30));
        let mut assistant = ScriptedAssistant::new([
            ModelTurn::Calls {
                thought: None,
                calls: vec![call(
                    tools::ADD_EVENT,
                    json!({ "title": "Call", "start": "2025-03-19T10:00:00", "memberIds": [mom] }),
                )],
            },
            ModelTurn::Reply {
                reply: "Booked".to_string(),
            },
        ]);

        session.run(&mut assistant, "book a call").await.unwrap();
        let event = &session.household.events[0];
        assert_eq!(event.end - event.start, Duration::minutes(30));
    }

    #[tokio::test]
    async fn assistant_failure_keeps_applied_changes() {
        let mut session = AgentSession::new(Household::default(), now());
        let mut assistant = ScriptedAssistant::new([ModelTurn::Calls {
            thought: None,
            calls: vec![call(tools::ADD_MEMBER, json!({ "name": "Dad" }))],
        }]);

        let err = session.run(&mut assistant, "add dad").await;
        assert!(matches!(err, Err(FamSyncError::Agent(_))));
        assert_eq!(session.household.members.len(), 1);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let mut session = AgentSession::new(Household::default(), now());
        let mut assistant = ScriptedAssistant::default();
        assert!(session.run(&mut assistant, "   ").await.is_err());
        assert!(assistant.inputs.is_empty());
    }

    #[test]
    fn script_parses_both_turn_shapes() {
        let script = r#"[
            {"thought": "Look up tasks", "calls": [{"name": "list_tasks", "args": {"type": "all"}}]},
            {"reply": "Done"}
        ]"#;
        let assistant = ScriptedAssistant::from_json(script).unwrap();
        assert_eq!(assistant.remaining(), 2);
    }

    #[test]
    fn system_prompt_lists_members() {
        let h = Household::default().add_member("Mom", None).unwrap().household;
        let prompt = system_prompt(&h, now());
        assert!(prompt.contains("\"name\":\"Mom\""));
        assert!(prompt.contains("2025-03-19T08:00:00"));
    }
}
