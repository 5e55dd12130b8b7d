//! 动作执行器
//!
//! 持有 ActionRegistry 与全局超时，execute(name, params) 在超时内调用 registry.dispatch，
//! 超时或失败时转为 AgentError（ActionTimeout / ActionExecutionFailed）；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::ActionRegistry;

/// 动作执行器：对每次调用施加超时，并将结果映射为 AgentError
pub struct ActionExecutor {
    registry: ActionRegistry,
    timeout: Duration,
}

impl ActionExecutor {
    pub fn new(registry: ActionRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定动作；未注册返回 None（不算错误），否则返回结果或 AgentError
    pub async fn execute(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Option<Result<String, AgentError>> {
        if !self.registry.contains(action) {
            tracing::debug!(action = %action, "action not registered, skipping");
            return None;
        }

        let start = Instant::now();
        let args_preview = args_preview(&params);
        let result = timeout(self.timeout, self.registry.dispatch(action, params)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Some(Ok(_))) => (true, "ok"),
            Ok(Some(Err(_))) | Ok(None) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "action_audit",
            "action": action,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "action");

        Some(match result {
            Ok(Some(Ok(content))) => Ok(content),
            Ok(Some(Err(e))) => Err(AgentError::ActionExecutionFailed(e)),
            Ok(None) => Err(AgentError::ActionExecutionFailed(format!(
                "action '{action}' disappeared from registry"
            ))),
            Err(_) => Err(AgentError::ActionTimeout(action.to_string())),
        })
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
