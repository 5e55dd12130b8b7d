//! Agent 组装
//!
//! create_llm_from_config 按配置与环境变量选择 LLM 后端，
//! create_action_registry 注册内置动作（search / calculate / echo），
//! create_orchestrator 把它们与智能体定义组装成 TurnOrchestrator。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::fsm::{AgentDefinition, TurnOrchestrator};
use crate::llm::{create_openrouter_client, LlmClient, MockLlmClient, OpenAiClient};
use crate::tools::{ActionExecutor, ActionRegistry, CalculateTool, EchoTool, SearchTool};

/// 根据配置与环境变量选择 LLM 后端（OpenRouter / OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let base_url = cfg.llm.base_url.as_deref();

    let client: Option<OpenAiClient> = match provider.as_str() {
        "mock" => None,
        "openai" => std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|key| OpenAiClient::new(base_url, &key)),
        _ => create_openrouter_client(base_url),
    };

    match client {
        Some(client) => {
            tracing::info!(provider = %provider, base_url = ?base_url, "Using OpenAI-compatible LLM");
            Arc::new(
                client
                    .with_max_tokens(cfg.llm.max_tokens)
                    .with_timeout_secs(cfg.llm.timeouts.request),
            )
        }
        None => {
            if provider != "mock" {
                tracing::warn!("No API key set or provider unknown, using Mock LLM");
            }
            Arc::new(MockLlmClient::default())
        }
    }
}

/// 注册内置动作
pub fn create_action_registry(cfg: &AppConfig) -> ActionRegistry {
    let mut actions = ActionRegistry::new();
    actions.register(SearchTool::new(
        cfg.actions.search.endpoint.clone(),
        cfg.actions.search.timeout_secs,
        cfg.actions.search.max_results,
    ));
    actions.register(CalculateTool);
    actions.register(EchoTool);
    actions
}

/// 组装编排器（不含事件通道，调用方可再 with_event_tx）
pub fn create_orchestrator(
    cfg: &AppConfig,
    definition: AgentDefinition,
    llm: Arc<dyn LlmClient>,
    actions: ActionRegistry,
) -> TurnOrchestrator {
    let executor = ActionExecutor::new(actions, cfg.actions.timeout_secs);
    TurnOrchestrator::new(Arc::new(definition), llm, Arc::new(executor))
        .with_default_model(cfg.llm.default_model.clone())
        .with_max_turns(cfg.app.max_turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_actions_registered() {
        let registry = create_action_registry(&AppConfig::default());
        assert_eq!(
            registry.action_names(),
            vec!["calculate".to_string(), "echo".to_string(), "search".to_string()]
        );
        assert!(registry
            .descriptions()
            .iter()
            .all(|(_, description)| !description.is_empty()));
    }

    #[tokio::test]
    async fn test_mock_provider_selected_explicitly() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        let llm = create_llm_from_config(&cfg);
        let output = llm
            .complete(&crate::llm::CompletionRequest {
                messages: vec![crate::memory::Message::user("ping")],
                model: "any".to_string(),
                temperature: 0.0,
            })
            .await
            .unwrap();
        assert!(output.contains("Echo from Mock: ping"));
    }
}
