//! Tool-driven assistant: the tool catalog, recommendations and the bounded
//! turn loop.
//!
//! The model itself lives outside this crate behind the [`Assistant`] trait.

pub mod recommendation;
pub mod session;
pub mod tools;

pub use recommendation::{Recommendation, RecommendationBoard, RecommendationKind};
pub use session::{
    AgentContext, AgentSession, Assistant, ModelTurn, RunOutcome, ScriptedAssistant, StopReason,
    ToolLog, TurnInput, TurnRecord,
};
pub use tools::{ToolCall, ToolOutcome, ToolSpec};
