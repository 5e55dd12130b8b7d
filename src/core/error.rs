//! Agent 错误类型
//!
//! 只有 UnknownState 会终止会话；模型调用失败与非法转移都在回合内部被吸收为普通的状态转移。

use thiserror::Error;

/// Agent 运行过程中可能出现的错误（配置、状态缺失、回复解析、动作执行）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Config error: {0}")]
    ConfigError(String),

    /// 当前状态在智能体定义中不存在，会话无法继续
    #[error("State '{0}' not found in configuration")]
    UnknownState(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Action execution failed: {0}")]
    ActionExecutionFailed(String),

    #[error("Action timeout: {0}")]
    ActionTimeout(String),
}
