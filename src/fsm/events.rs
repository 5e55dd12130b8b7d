//! 回合过程事件：供审计日志等外部 sink 记录每次 Prompt、回复、动作与转移

use serde::Serialize;

use crate::fsm::transition::RejectReason;
use crate::memory::Message;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// 会话开始
    SessionStarted {
        session_id: String,
        initial_state: String,
    },
    /// 外部用户输入（含会话开始时的初始输入）
    UserInput { text: String },
    /// 新回合开始
    LoopStarted {
        loop_count: usize,
        state: String,
        allowed_transitions: Vec<String>,
    },
    /// 发往 LLM 的完整请求
    LlmRequest {
        model: String,
        temperature: f32,
        messages: Vec<Message>,
    },
    /// LLM 原始输出
    LlmRawResponse { text: String },
    /// LLM 调用失败或输出无法解析，已换成兜底回复
    LlmFailure { error: String },
    /// 解析后的模型决策
    Decision {
        action: String,
        next_state: String,
        require_input: bool,
    },
    /// 助手回复（已写入主对话并展示给用户）
    AssistantMessage { text: String },
    /// 动作已执行
    ActionExecuted {
        action: String,
        params: serde_json::Value,
        result: String,
    },
    /// 结果写入了搜索历史
    SearchRecorded { index: usize },
    /// 结果以 system 消息写入了主对话
    ActionResultRecorded { content: String },
    /// 合法转移
    Transition { from: String, to: String },
    /// 非法转移，当前状态被强制为 error
    InvalidTransition {
        from: String,
        to: String,
        reason: RejectReason,
    },
    /// 无需用户输入，直接进入下一回合
    AutoContinue,
    /// 会话正常结束
    Terminated { loop_count: usize },
    /// 当前状态未定义，会话中止
    Faulted { state: String },
}

impl TurnEvent {
    /// 事件标题（审计日志的分节标题）
    pub fn title(&self) -> &'static str {
        match self {
            TurnEvent::SessionStarted { .. } => "Session started",
            TurnEvent::UserInput { .. } => "User input",
            TurnEvent::LoopStarted { .. } => "Loop",
            TurnEvent::LlmRequest { .. } => "LLM request",
            TurnEvent::LlmRawResponse { .. } => "LLM RAW RESPONSE",
            TurnEvent::LlmFailure { .. } => "LLM failure",
            TurnEvent::Decision { .. } => "LLM decision",
            TurnEvent::AssistantMessage { .. } => "Assistant reply",
            TurnEvent::ActionExecuted { .. } => "Action executed",
            TurnEvent::SearchRecorded { .. } => "Search result recorded",
            TurnEvent::ActionResultRecorded { .. } => "Action result added to conversation",
            TurnEvent::Transition { .. } => "Transition",
            TurnEvent::InvalidTransition { .. } => "Invalid transition",
            TurnEvent::AutoContinue => "Auto continue",
            TurnEvent::Terminated { .. } => "Terminated",
            TurnEvent::Faulted { .. } => "Faulted",
        }
    }
}
