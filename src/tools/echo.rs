//! Echo 动作（演示与测试用）

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Action;

/// Echo 动作：原样返回 text 参数；缺省时返回空串（不写入历史）
pub struct EchoTool;

#[async_trait]
impl Action for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo text back as an action result. Params: {\"text\": \"message\"}"
    }

    async fn execute(&self, params: Value) -> Result<String, String> {
        let text = params
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(text.to_string())
    }
}
