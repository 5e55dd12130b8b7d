//! Mock / Scripted LLM 客户端（用于测试与无 API Key 的本地运行）
//!
//! - MockLlmClient：取最后一条 User 消息，回显为一个合法的回复 JSON，并直接结束会话。
//! - ScriptedLlmClient：按顺序回放预设输出（或失败），并记录每次请求，便于断言 Prompt 组装结果。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::memory::Role;

/// Mock 客户端：回显用户最后一条消息
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    next_state: String,
}

impl MockLlmClient {
    pub fn new(next_state: impl Into<String>) -> Self {
        Self {
            next_state: next_state.into(),
        }
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new("exit")
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(serde_json::json!({
            "action": "",
            "message": format!("Echo from Mock: {}", last_user),
            "next_state": self.next_state,
            "require_input": "1",
        })
        .to_string())
    }
}

/// 脚本化客户端：依次返回预设输出；脚本耗尽后若设置了 repeat 则一直返回它，否则返回错误
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    repeat: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(outputs.into_iter().map(|s| Ok(s.into())).collect()),
            ..Self::default()
        }
    }

    /// 每次都返回同一输出
    pub fn repeating(output: impl Into<String>) -> Self {
        Self {
            repeat: Some(output.into()),
            ..Self::default()
        }
    }

    /// 追加一次成功输出
    pub fn then_output(self, output: impl Into<String>) -> Self {
        self.push(Ok(output.into()));
        self
    }

    /// 追加一次调用失败
    pub fn then_failure(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, item: Result<String, LlmError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
    }

    /// 迄今收到的全部请求
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match (next, &self.repeat) {
            (Some(item), _) => item,
            (None, Some(output)) => Ok(output.clone()),
            (None, None) => Err(LlmError::Request("script exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Message;

    fn request(messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            messages,
            model: "test-model".to_string(),
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn test_mock_echoes_last_user_message() {
        let client = MockLlmClient::default();
        let output = client
            .complete(&request(vec![
                Message::system("sys"),
                Message::user("first"),
                Message::assistant("reply"),
                Message::user("second"),
            ]))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["message"], "Echo from Mock: second");
        assert_eq!(value["next_state"], "exit");
    }

    #[tokio::test]
    async fn test_scripted_replays_in_order_then_fails() {
        let client = ScriptedLlmClient::new(["a"])
            .then_failure(LlmError::Timeout(5))
            .then_output("b");
        let req = request(vec![Message::user("x")]);

        assert_eq!(client.complete(&req).await.unwrap(), "a");
        assert_eq!(client.complete(&req).await, Err(LlmError::Timeout(5)));
        assert_eq!(client.complete(&req).await.unwrap(), "b");
        assert!(client.complete(&req).await.is_err());
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test]
    async fn test_scripted_repeating() {
        let client = ScriptedLlmClient::repeating("same");
        let req = request(vec![]);
        for _ in 0..3 {
            assert_eq!(client.complete(&req).await.unwrap(), "same");
        }
    }
}
