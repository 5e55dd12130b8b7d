//! 可观测性：tracing 初始化与审计日志
//!
//! AuditLog 消费 TurnEvent，按时间戳逐行追加到 `agent_log_<YYYY-mm-dd_HHMMSS>.txt`；
//! 结构化内容以 `===== 标题 =====` 包围的格式化 JSON 写入。写入失败只记录告警，不影响会话。

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::fsm::TurnEvent;

/// 日志：默认 info，dev 模式为 debug；RUST_LOG 可覆盖
pub fn init(dev_mode: bool) {
    let level = if dev_mode { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

/// 文件审计日志
pub struct AuditLog {
    path: PathBuf,
    file: File,
}

impl AuditLog {
    /// 在 dir 下创建以当前时间命名的日志文件
    pub fn create(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H%M%S");
        let path = dir.join(format!("agent_log_{}.txt", stamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写一行带时间戳的信息
    pub fn info(&mut self, message: &str) -> std::io::Result<()> {
        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "[{}] {}", ts, message)
    }

    /// 写一段标题包围的格式化 JSON
    pub fn json(&mut self, title: &str, data: &serde_json::Value) -> std::io::Result<()> {
        self.info(&format!("===== {} =====", title))?;
        let formatted =
            serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        writeln!(self.file, "{}", formatted)?;
        self.info(&"=".repeat(title.chars().count() + 12))
    }

    /// 记录一个事件：简单事件写一行，带正文的事件写 JSON
    pub fn record(&mut self, event: &TurnEvent) -> std::io::Result<()> {
        match event {
            TurnEvent::LoopStarted {
                loop_count,
                state,
                allowed_transitions,
            } => {
                self.info(&format!("===== LOOP #{} =====", loop_count))?;
                self.info(&format!("Current state: {}", state))?;
                self.info(&format!("Allowed transitions: {:?}", allowed_transitions))
            }
            TurnEvent::LlmFailure { error } => self.info(&format!("Error: {}", error)),
            TurnEvent::Transition { from, to } => {
                self.info(&format!("Transitioning from '{}' to '{}'", from, to))
            }
            TurnEvent::InvalidTransition { from, to, .. } => self.info(&format!(
                "Error: Invalid transition from '{}' to '{}'",
                from, to
            )),
            TurnEvent::AutoContinue => {
                self.info("No user input required, proceeding to next state automatically")
            }
            TurnEvent::Terminated { .. } => self.info("Reached terminal state, exiting."),
            TurnEvent::Faulted { state } => self.info(&format!(
                "Error: State '{}' not found in configuration",
                state
            )),
            other => {
                let value = serde_json::to_value(other).unwrap_or(serde_json::Value::Null);
                self.json(other.title(), &value)
            }
        }
    }

    /// 在后台任务中消费事件直到发送端全部关闭
    pub fn spawn(mut self, mut rx: mpsc::UnboundedReceiver<TurnEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = self.record(&event) {
                    tracing::warn!(path = %self.path.display(), "audit log write failed: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::RejectReason;
    use crate::memory::Message;

    #[test]
    fn test_record_writes_lines_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = AuditLog::create(dir.path()).unwrap();
        let name = log.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("agent_log_") && name.ends_with(".txt"));

        log.record(&TurnEvent::LoopStarted {
            loop_count: 1,
            state: "start".to_string(),
            allowed_transitions: vec!["middle".to_string()],
        })
        .unwrap();
        log.record(&TurnEvent::LlmRequest {
            model: "m".to_string(),
            temperature: 0.5,
            messages: vec![Message::system("SYS"), Message::user("hi")],
        })
        .unwrap();
        log.record(&TurnEvent::InvalidTransition {
            from: "start".to_string(),
            to: "nowhere".to_string(),
            reason: RejectReason::UnknownState,
        })
        .unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(text.contains("===== LOOP #1 ====="));
        assert!(text.contains("Current state: start"));
        assert!(text.contains("===== LLM request ====="));
        assert!(text.contains("\"role\": \"user\""));
        assert!(text.contains("Error: Invalid transition from 'start' to 'nowhere'"));
    }

    #[tokio::test]
    async fn test_spawn_drains_channel() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::create(dir.path()).unwrap();
        let path = log.path().to_path_buf();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = log.spawn(rx);

        tx.send(TurnEvent::UserInput {
            text: "hello".to_string(),
        })
        .unwrap();
        tx.send(TurnEvent::Terminated { loop_count: 1 }).unwrap();
        drop(tx);
        handle.await.unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("\"text\": \"hello\""));
        assert!(text.contains("Reached terminal state, exiting."));
    }
}
