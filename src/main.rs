//! fsm-agent 命令行入口
//!
//! 用法：`fsm-agent [--config app.toml] [--agent agent_config.toml] [--dev] [--list-actions] [初始输入...]`
//! 初始化日志、加载配置与智能体定义、注册动作，然后在控制台上运行会话直到结束。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fsm_agent::{
    agent::{create_action_registry, create_llm_from_config, create_orchestrator},
    config::load_config,
    fsm::AgentDefinition,
    observability::{self, AuditLog},
    ui::ConsoleChannel,
};
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(
    name = "fsm-agent",
    about = "由状态机配置驱动的对话智能体",
    version
)]
struct CliArgs {
    /// 应用配置文件（叠加在 config/default.toml 之上）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 智能体定义（状态机）文件
    #[arg(long)]
    agent: Option<PathBuf>,

    /// 开发模式：debug 日志，记录完整请求与原始回复
    #[arg(long)]
    dev: bool,

    /// 列出内置动作及其参数说明后退出（编写状态提示词时参考）
    #[arg(long)]
    list_actions: bool,

    /// 会话的第一条用户输入；缺省时使用配置中的 initial_input
    #[arg(trailing_var_arg = true)]
    initial_input: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let mut cfg = load_config(args.config.clone()).context("Failed to load config")?;
    if args.dev {
        cfg.app.dev_mode = true;
    }
    if let Some(agent) = args.agent {
        cfg.app.agent_definition = agent;
    }

    if args.list_actions {
        for (name, description) in create_action_registry(&cfg).descriptions() {
            println!("{:<10} {}", name, description);
        }
        return Ok(());
    }

    observability::init(cfg.app.dev_mode);
    if cfg.app.dev_mode {
        tracing::info!("Starting agent in DEVELOPMENT mode - detailed logs will be shown");
    }

    let definition = AgentDefinition::load(&cfg.app.agent_definition).with_context(|| {
        format!(
            "Failed to load agent definition from {}",
            cfg.app.agent_definition.display()
        )
    })?;

    let llm = create_llm_from_config(&cfg);
    let actions = create_action_registry(&cfg);
    let mut orchestrator = create_orchestrator(&cfg, definition, llm, actions);

    let audit_task = if cfg.audit.enabled {
        match AuditLog::create(&cfg.audit.dir) {
            Ok(log) => {
                tracing::info!(path = %log.path().display(), "Logging to file");
                let (event_tx, event_rx) = mpsc::unbounded_channel();
                orchestrator = orchestrator.with_event_tx(event_tx);
                Some(log.spawn(event_rx))
            }
            Err(e) => {
                tracing::warn!("audit log disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let initial_input = if args.initial_input.is_empty() {
        cfg.app.initial_input.clone()
    } else {
        Some(args.initial_input.join(" "))
    };

    let mut channel = ConsoleChannel::new();
    let result = orchestrator
        .run(&mut channel, initial_input.as_deref())
        .await;

    // 关闭事件通道，等审计日志写完
    drop(orchestrator);
    if let Some(task) = audit_task {
        let _ = task.await;
    }

    let status = result.context("Agent session failed")?;
    tracing::debug!(status = ?status, "agent exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("fsm-agent").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_flags_and_input() {
        let parsed = args(&["--dev", "--agent", "a.toml", "hello", "--not-a-flag"]).unwrap();
        assert!(parsed.dev);
        assert_eq!(parsed.agent, Some(PathBuf::from("a.toml")));
        assert_eq!(parsed.initial_input, vec!["hello", "--not-a-flag"]);
    }

    #[test]
    fn test_parse_list_actions() {
        let parsed = args(&["--list-actions"]).unwrap();
        assert!(parsed.list_actions);
        assert!(parsed.initial_input.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }
}
