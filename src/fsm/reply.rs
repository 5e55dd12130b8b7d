//! 模型回复解析
//!
//! 期望 LLM 输出一个 JSON 对象：
//! `{"action": "...", "message": "...", "next_state": "...", "require_input": "1", "action_params": {...}}`。
//! 缺失字段取默认值；输出不是 JSON 对象时返回 JsonParseError，由编排器换成兜底回复。

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::AgentError;
use crate::fsm::definition::ERROR_STATE;

/// 兜底回复中的道歉文本（模型输出无法解析时）
pub const MALFORMED_REPLY_MESSAGE: &str =
    "I apologize, but I encountered an error processing your request.";

/// 单回合的模型决策
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReply {
    pub action: String,
    pub message: String,
    pub next_state: String,
    pub require_input: bool,
    pub action_params: Map<String, Value>,
}

impl Default for ModelReply {
    fn default() -> Self {
        Self {
            action: String::new(),
            message: String::new(),
            next_state: String::new(),
            require_input: true,
            action_params: Map::new(),
        }
    }
}

impl ModelReply {
    /// 模型输出不是合法 JSON 对象时的兜底
    pub fn malformed() -> Self {
        Self::fallback(MALFORMED_REPLY_MESSAGE.to_string())
    }

    /// 模型调用本身失败（网络、超时等）时的兜底
    pub fn call_failed(detail: impl std::fmt::Display) -> Self {
        Self::fallback(format!("Error occurred: {}", detail))
    }

    fn fallback(message: String) -> Self {
        Self {
            action: "error".to_string(),
            message,
            next_state: ERROR_STATE.to_string(),
            require_input: true,
            action_params: Map::new(),
        }
    }

    /// next_state 为空或为 exit 时会话结束
    pub fn is_terminal(&self) -> bool {
        self.next_state.is_empty() || self.next_state == crate::fsm::definition::EXIT_STATE
    }
}

/// 剥掉 ```json ... ``` 围栏（部分模型即使被要求输出 JSON 也会加）
fn strip_code_fence(output: &str) -> &str {
    let trimmed = output.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// 字符串字段：null/缺失取空串，非字符串值转为其 JSON 文本
fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// require_input：`"1"` / `1` / `true` 为真；缺失、null 或数组/对象这类畸形值默认为真；
/// 其余标量为假
pub fn parse_require_input(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::String(s)) => s.trim() == "1",
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
    }
}

/// 解析 LLM 原始输出
pub fn parse_model_reply(output: &str) -> Result<ModelReply, AgentError> {
    let json_str = strip_code_fence(output);
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))?;
    let Value::Object(obj) = value else {
        return Err(AgentError::JsonParseError(format!(
            "expected a JSON object: {}",
            json_str
        )));
    };

    let action_params = match obj.get("action_params") {
        Some(Value::Object(params)) => params.clone(),
        _ => Map::new(),
    };

    Ok(ModelReply {
        action: text_field(&obj, "action"),
        message: text_field(&obj, "message"),
        next_state: text_field(&obj, "next_state"),
        require_input: parse_require_input(obj.get("require_input")),
        action_params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_reply() {
        let reply = parse_model_reply(
            r#"{"action": "search", "message": "Looking it up", "next_state": "research",
                "require_input": "0", "action_params": {"query": "rust"}}"#,
        )
        .unwrap();
        assert_eq!(reply.action, "search");
        assert_eq!(reply.message, "Looking it up");
        assert_eq!(reply.next_state, "research");
        assert!(!reply.require_input);
        assert_eq!(reply.action_params.get("query"), Some(&json!("rust")));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let reply = parse_model_reply("{}").unwrap();
        assert_eq!(reply, ModelReply::default());
        assert!(reply.require_input);
        assert!(reply.is_terminal());
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let reply =
            parse_model_reply("```json\n{\"message\": \"hi\", \"next_state\": \"a\"}\n```").unwrap();
        assert_eq!(reply.message, "hi");
        assert_eq!(reply.next_state, "a");
    }

    #[test]
    fn test_non_json_is_error() {
        assert!(matches!(
            parse_model_reply("Sure, let me help!"),
            Err(AgentError::JsonParseError(_))
        ));
        assert!(matches!(
            parse_model_reply("[1, 2, 3]"),
            Err(AgentError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_require_input_rules() {
        assert!(parse_require_input(None));
        assert!(parse_require_input(Some(&Value::Null)));
        assert!(parse_require_input(Some(&json!("1"))));
        assert!(parse_require_input(Some(&json!(1))));
        assert!(parse_require_input(Some(&json!(true))));
        assert!(!parse_require_input(Some(&json!("0"))));
        assert!(!parse_require_input(Some(&json!("yes"))));
        assert!(!parse_require_input(Some(&json!(0))));
        assert!(!parse_require_input(Some(&json!(false))));
        assert!(parse_require_input(Some(&json!(["0"]))));
        assert!(parse_require_input(Some(&json!({"value": "0"}))));
    }

    #[test]
    fn test_non_object_params_are_ignored() {
        let reply = parse_model_reply(r#"{"action": "calculate", "action_params": "1+1"}"#).unwrap();
        assert!(reply.action_params.is_empty());
    }

    #[test]
    fn test_fallbacks_route_to_error() {
        let malformed = ModelReply::malformed();
        assert_eq!(malformed.action, "error");
        assert_eq!(malformed.next_state, ERROR_STATE);
        assert_eq!(malformed.message, MALFORMED_REPLY_MESSAGE);
        assert!(malformed.require_input);

        let failed = ModelReply::call_failed("connection refused");
        assert_eq!(failed.message, "Error occurred: connection refused");
        assert!(!failed.is_terminal());
    }
}
