use chrono::NaiveDate;
use famsync_core::agent::tools;
use famsync_core::agent::{AgentSession, ModelTurn, ScriptedAssistant, StopReason, ToolCall, TurnInput};
use famsync_core::{Household, Instant, TaskCategory};
use serde_json::json;

fn now() -> Instant {
    NaiveDate::from_ymd_opt(2025, 3, 19)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn family() -> Household {
    let h = Household::default();
    let h = h.add_member("Mom", None).unwrap().household;
    let h = h.add_member("Dad", None).unwrap().household;
    h.add_member("Leo", None).unwrap().household
}

#[tokio::test]
async fn looks_up_members_then_adds_task() {
    let household = family();
    let mom = household.members[0].id.clone();
    let dad = household.members[1].id.clone();

    let mut assistant = ScriptedAssistant::new([
        ModelTurn::Calls {
            thought: Some("I need the member ids first.".to_string()),
            calls: vec![ToolCall::new(tools::LIST_MEMBERS, json!({}))],
        },
        ModelTurn::Calls {
            thought: None,
            calls: vec![ToolCall::new(
                tools::ADD_TASK,
                json!({
                    "title": "Buy groceries",
                    "type": "shopping",
                    "dueDate": "2025-03-20",
                    "assigneeIds": [mom, dad]
                }),
            )],
        },
        ModelTurn::Reply {
            reply: "Added groceries for Mom and Dad.".to_string(),
        },
    ]);

    let mut session = AgentSession::new(household, now());
    let outcome = session
        .run(&mut assistant, "Add a task for Mom and Dad to buy groceries tomorrow")
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::Replied);
    assert_eq!(outcome.turns, 3);

    let task = &session.household.tasks[0];
    assert_eq!(task.title, "Buy groceries");
    assert_eq!(task.category, TaskCategory::Shopping);
    assert_eq!(task.assignee_ids, vec![mom, dad]);

    let TurnInput::ToolResults { results } = &assistant.inputs[1] else {
        panic!("second turn should receive tool results");
    };
    assert_eq!(results[0].result["members"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn rejected_command_is_reported_and_loop_continues() {
    let mut assistant = ScriptedAssistant::new([
        ModelTurn::Calls {
            thought: None,
            calls: vec![ToolCall::new(
                tools::ADD_TASK,
                json!({ "title": "Mow lawn", "type": "chores", "assigneeIds": [] }),
            )],
        },
        ModelTurn::Reply {
            reply: "Who should mow the lawn?".to_string(),
        },
    ]);

    let mut session = AgentSession::new(family(), now());
    let outcome = session.run(&mut assistant, "someone mow the lawn").await.unwrap();

    assert_eq!(outcome.reply.as_deref(), Some("Who should mow the lawn?"));
    assert!(session.household.tasks.is_empty());
    let log = &session.transcript[0].tool_logs[0];
    assert!(log.result["error"].is_string());
}

#[tokio::test]
async fn recommendations_can_be_accepted_after_the_run() {
    let mut assistant = ScriptedAssistant::new([
        ModelTurn::Calls {
            thought: Some("Suggest a weekend plan.".to_string()),
            calls: vec![ToolCall::new(
                tools::DISPLAY_RECOMMENDATIONS,
                json!({
                    "recommendations": [
                        {
                            "title": "Weekend Hike",
                            "description": "Morning hike at the state park",
                            "category": "event",
                            "data": { "start": "2025-03-22T09:00:00", "end": "2025-03-22T12:00:00" }
                        },
                        {
                            "title": "Sunday Meal Prep",
                            "description": "Cook lunches for the week",
                            "category": "task",
                            "data": { "type": "chores", "dueDate": "2025-03-23" }
                        }
                    ]
                }),
            )],
        },
        ModelTurn::Reply {
            reply: "Here are some ideas!".to_string(),
        },
    ]);

    let mut session = AgentSession::new(family(), now());
    session.run(&mut assistant, "ideas for the weekend?").await.unwrap();
    assert_eq!(session.board.pending().count(), 2);
    let now = session.now();
    let length = session.event_length();

    let applied = session
        .board
        .accept(&session.household, "1_turn_1", 0, now, length)
        .unwrap();
    session.household = applied.household;
    let applied = session
        .board
        .accept(&session.household, "1_turn_1", 0, now, length)
        .unwrap();
    session.household = applied.household;

    assert!(session.board.is_empty());
    assert_eq!(session.household.events[0].title, "Weekend Hike");
    assert_eq!(session.household.tasks[0].title, "Sunday Meal Prep");
    assert_eq!(
        session.household.tasks[0].assignee_ids,
        vec![session.household.members[0].id.clone()]
    );
}

#[tokio::test]
async fn turn_ids_are_scoped_per_request() {
    let mut assistant = ScriptedAssistant::new([
        ModelTurn::Reply {
            reply: "one".to_string(),
        },
        ModelTurn::Reply {
            reply: "two".to_string(),
        },
    ]);
    let mut session = AgentSession::new(family(), now());
    session.run(&mut assistant, "first").await.unwrap();
    session.run(&mut assistant, "second").await.unwrap();

    let ids: Vec<_> = session.transcript.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1_turn_1", "2_turn_1"]);
}
