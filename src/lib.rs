//! fsm-agent - 由状态机驱动的对话智能体
//!
//! 智能体的行为完全由外部配置描述：一组命名状态，每个状态带提示词模板、模型参数与允许的后继状态。
//! 每回合由 LLM 选择动作、回复与下一状态，编排器显式推进状态机。
//!
//! 模块划分：
//! - **agent**: 按配置组装 LLM、动作与编排器
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **fsm**: 智能体定义、Prompt 组装、转移校验、回复解析、回合编排主循环
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / OpenRouter / Mock / Scripted）
//! - **memory**: 主对话历史与搜索历史
//! - **observability**: 日志初始化与审计日志
//! - **tools**: 动作注册表、执行器与内置动作（search、calculate、echo）
//! - **ui**: 用户通道（控制台 / 脚本化）

pub mod agent;
pub mod config;
pub mod core;
pub mod fsm;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;
pub mod ui;

pub use fsm::{AgentDefinition, OrchestratorStatus, TurnOrchestrator};
