//! OpenRouter 客户端（OpenAI 兼容格式）
//!
//! - Base URL: https://openrouter.ai/api/v1
//! - API Key: 优先 `OPENROUTER_API_KEY`，其次 `OPENAI_API_KEY`

use crate::llm::OpenAiClient;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// 状态未指定 model 时使用的模型
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// 从环境变量读取 API Key；均未设置时返回 None
pub fn api_key_from_env() -> Option<String> {
    std::env::var("OPENROUTER_API_KEY")
        .ok()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty())
}

/// 创建 OpenRouter 客户端；base_url 为 None 时使用官方端点。无 API Key 时返回 None。
pub fn create_openrouter_client(base_url: Option<&str>) -> Option<OpenAiClient> {
    let api_key = api_key_from_env()?;
    let base_url = base_url.unwrap_or(OPENROUTER_BASE_URL);
    Some(OpenAiClient::new(Some(base_url), &api_key))
}
