//! 状态机层：智能体定义、Prompt 组装、转移校验、回复解析、回合编排主循环

pub mod definition;
pub mod events;
pub mod loop_;
pub mod prompt;
pub mod reply;
pub mod session;
pub mod transition;

pub use definition::{AgentDefinition, Description, StateSpec, ERROR_STATE, EXIT_STATE};
pub use events::TurnEvent;
pub use loop_::{OrchestratorStatus, TurnOrchestrator, TurnOutcome, SEARCH_ACTION};
pub use prompt::{build_messages, compose_system_prompt};
pub use reply::{parse_model_reply, ModelReply};
pub use session::AgentSession;
pub use transition::{validate_transition, RejectReason, TransitionDecision};
