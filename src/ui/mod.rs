//! 用户通道：把助手回复与错误展示给用户，并在需要时阻塞等待用户输入
//!
//! - ConsoleChannel：标准输入输出（`Agent: ...` / `You: `）
//! - ScriptedChannel：预设输入、记录输出，用于测试与批处理

pub mod console;
pub mod scripted;

use async_trait::async_trait;

pub use console::ConsoleChannel;
pub use scripted::ScriptedChannel;

#[async_trait]
pub trait UserChannel: Send {
    /// 展示本回合的助手回复（每回合恰好一次，兜底回复也会展示）
    async fn present_message(&mut self, message: &str);

    /// 展示非法转移、状态缺失等错误
    async fn present_error(&mut self, error: &str);

    /// 阻塞等待下一条用户输入；输入结束（EOF）时返回 None
    async fn read_input(&mut self) -> Option<String>;
}
