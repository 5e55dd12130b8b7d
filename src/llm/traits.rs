//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / OpenRouter / Mock / Scripted）实现 LlmClient：
//! 每次调用携带完整消息序列、模型名与温度，返回模型的原始文本输出（期望为 JSON 对象）。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

/// 单次补全请求：messages 首条为组装好的 system 上下文，其后为完整主对话
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub temperature: f32,
}

/// LLM 调用层错误（传输失败、空回复、超时）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成，返回首个候选的文本内容
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
