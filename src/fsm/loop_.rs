//! 回合编排主循环
//!
//! 每回合：查当前状态 -> 组装 system + 完整对话 -> 调 LLM（失败则兜底到 error）->
//! 写入并展示助手回复 -> 分派动作并路由结果 -> 校验转移 -> 判断是否结束 -> 按需等待用户输入。
//! 可选 event_tx：向审计日志等外部 sink 推送 TurnEvent。

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::AgentError;
use crate::fsm::definition::{AgentDefinition, StateSpec, ERROR_STATE};
use crate::fsm::events::TurnEvent;
use crate::fsm::prompt::{build_messages, compose_system_prompt};
use crate::fsm::reply::{parse_model_reply, ModelReply};
use crate::fsm::session::AgentSession;
use crate::fsm::transition::{validate_transition, TransitionDecision};
use crate::llm::{CompletionRequest, LlmClient, DEFAULT_MODEL};
use crate::memory::Message;
use crate::tools::ActionExecutor;
use crate::ui::UserChannel;

/// 结果写入搜索历史而非主对话的保留动作名
pub const SEARCH_ACTION: &str = "search";

/// 编排器自身的状态（区别于配置中的智能体状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorStatus {
    AwaitingTurn,
    Terminated,
    Faulted,
}

/// 单回合结束后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// 继续；require_input 为 true 时需先等待用户输入
    Continue { require_input: bool },
    Terminated,
}

/// 回合编排器：独占一个 AgentSession
pub struct TurnOrchestrator {
    definition: Arc<AgentDefinition>,
    llm: Arc<dyn LlmClient>,
    executor: Arc<ActionExecutor>,
    session: AgentSession,
    status: OrchestratorStatus,
    default_model: String,
    /// 回合数上限，None 表示不限
    max_turns: Option<usize>,
    event_tx: Option<mpsc::UnboundedSender<TurnEvent>>,
}

impl TurnOrchestrator {
    pub fn new(
        definition: Arc<AgentDefinition>,
        llm: Arc<dyn LlmClient>,
        executor: Arc<ActionExecutor>,
    ) -> Self {
        let session = AgentSession::new(definition.initial_state.clone());
        Self {
            definition,
            llm,
            executor,
            session,
            status: OrchestratorStatus::AwaitingTurn,
            default_model: DEFAULT_MODEL.to_string(),
            max_turns: None,
            event_tx: None,
        }
    }

    /// 设置状态未指定 model 时的默认模型
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// 设置事件推送通道
    pub fn with_event_tx(mut self, tx: mpsc::UnboundedSender<TurnEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn session(&self) -> &AgentSession {
        &self.session
    }

    pub fn status(&self) -> OrchestratorStatus {
        self.status
    }

    fn send_event(&self, ev: TurnEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ev);
        }
    }

    /// 会话开始：有初始输入时作为第一条 user 消息
    pub fn start(&mut self, initial_input: Option<&str>) {
        self.send_event(TurnEvent::SessionStarted {
            session_id: self.session.id().to_string(),
            initial_state: self.session.current_state().to_string(),
        });
        tracing::info!(
            session = %self.session.id(),
            initial_state = %self.session.current_state(),
            "session started"
        );
        if let Some(text) = initial_input.filter(|t| !t.is_empty()) {
            self.submit_user_input(text);
        }
    }

    /// 追加一条外部用户输入
    pub fn submit_user_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(input = %text, "user input");
        self.send_event(TurnEvent::UserInput { text: text.clone() });
        self.session.history_mut().push_message(Message::user(text));
    }

    /// 执行一个回合（不含等待用户输入）
    ///
    /// 只有当前状态未定义时返回 Err，此时编排器进入 Faulted。
    pub async fn run_turn(
        &mut self,
        channel: &mut dyn UserChannel,
    ) -> Result<TurnOutcome, AgentError> {
        match self.status {
            OrchestratorStatus::AwaitingTurn => {}
            OrchestratorStatus::Terminated => return Ok(TurnOutcome::Terminated),
            OrchestratorStatus::Faulted => {
                return Err(AgentError::UnknownState(
                    self.session.current_state().to_string(),
                ))
            }
        }

        let loop_count = self.session.begin_loop();
        let state_id = self.session.current_state().to_string();

        let definition = Arc::clone(&self.definition);
        let Some(spec) = definition.state(&state_id) else {
            let err = AgentError::UnknownState(state_id.clone());
            tracing::error!(loop_count, state = %state_id, "{}", err);
            channel.present_error(&format!("Error: {}", err)).await;
            self.status = OrchestratorStatus::Faulted;
            self.send_event(TurnEvent::Faulted { state: state_id });
            return Err(err);
        };

        tracing::info!(loop_count, state = %state_id, transitions = ?spec.transitions, "===== LOOP =====");
        self.send_event(TurnEvent::LoopStarted {
            loop_count,
            state: state_id.clone(),
            allowed_transitions: spec.transitions.clone(),
        });

        let system = compose_system_prompt(&definition, spec, &self.session);
        let request = CompletionRequest {
            messages: build_messages(system, &self.session),
            model: spec.model_or(&self.default_model).to_string(),
            temperature: spec.temperature,
        };
        let reply = self.call_model(&request).await;

        tracing::info!(
            action = %reply.action,
            next_state = %reply.next_state,
            require_input = reply.require_input,
            "LLM decided"
        );
        self.send_event(TurnEvent::Decision {
            action: reply.action.clone(),
            next_state: reply.next_state.clone(),
            require_input: reply.require_input,
        });

        // 兜底回复同样写入并展示
        self.session
            .history_mut()
            .push_message(Message::assistant(reply.message.clone()));
        self.send_event(TurnEvent::AssistantMessage {
            text: reply.message.clone(),
        });
        channel.present_message(&reply.message).await;

        self.dispatch_action(&reply).await;

        self.apply_transition(spec, &reply.next_state, channel).await;

        // 以模型给出的 next_state 判断，而非（可能被改写为 error 的）当前状态
        if reply.is_terminal() {
            self.finish("Reached terminal state, exiting.");
            return Ok(TurnOutcome::Terminated);
        }

        Ok(TurnOutcome::Continue {
            require_input: reply.require_input,
        })
    }

    /// 运行整个会话直到结束；返回最终编排器状态，状态缺失时返回 UnknownState
    pub async fn run(
        &mut self,
        channel: &mut dyn UserChannel,
        initial_input: Option<&str>,
    ) -> Result<OrchestratorStatus, AgentError> {
        self.start(initial_input);

        loop {
            if let Some(max) = self.max_turns {
                if self.session.loop_count() >= max {
                    tracing::warn!(max_turns = max, "turn limit reached");
                    self.finish("Turn limit reached, exiting.");
                    break;
                }
            }

            match self.run_turn(channel).await? {
                TurnOutcome::Terminated => break,
                TurnOutcome::Continue { require_input: true } => {
                    match channel.read_input().await {
                        Some(text) => self.submit_user_input(text),
                        None => {
                            self.finish("User input closed, exiting.");
                            break;
                        }
                    }
                }
                TurnOutcome::Continue {
                    require_input: false,
                } => {
                    tracing::debug!("No user input required, proceeding to next state automatically");
                    self.send_event(TurnEvent::AutoContinue);
                }
            }
        }

        let (prompt_tokens, completion_tokens, total_tokens) = self.llm.token_usage();
        tracing::info!(
            loops = self.session.loop_count(),
            prompt_tokens,
            completion_tokens,
            total_tokens,
            "session finished"
        );
        Ok(self.status)
    }

    fn finish(&mut self, reason: &str) {
        tracing::info!("{}", reason);
        self.status = OrchestratorStatus::Terminated;
        self.send_event(TurnEvent::Terminated {
            loop_count: self.session.loop_count(),
        });
    }

    /// 调用 LLM 并解析；任何失败都换成路由到 error 状态的兜底回复，不向上传播
    async fn call_model(&self, request: &CompletionRequest) -> ModelReply {
        tracing::debug!(
            model = %request.model,
            temperature = request.temperature,
            messages = request.messages.len(),
            "CALLING LLM"
        );
        for (i, msg) in request.messages.iter().enumerate() {
            tracing::debug!(index = i, role = ?msg.role, "{}", msg.content);
        }
        self.send_event(TurnEvent::LlmRequest {
            model: request.model.clone(),
            temperature: request.temperature,
            messages: request.messages.clone(),
        });

        match self.llm.complete(request).await {
            Ok(raw) => {
                tracing::debug!(raw = %raw, "LLM RAW RESPONSE");
                self.send_event(TurnEvent::LlmRawResponse { text: raw.clone() });
                parse_model_reply(&raw).unwrap_or_else(|e| {
                    tracing::warn!("LLM response is not a valid reply: {}", e);
                    self.send_event(TurnEvent::LlmFailure {
                        error: e.to_string(),
                    });
                    ModelReply::malformed()
                })
            }
            Err(e) => {
                tracing::warn!("Error calling LLM API: {}", e);
                self.send_event(TurnEvent::LlmFailure {
                    error: e.to_string(),
                });
                ModelReply::call_failed(&e)
            }
        }
    }

    /// 分派动作：search 结果进搜索历史，其余非空结果以 system 消息进主对话；未注册的名字直接忽略
    async fn dispatch_action(&mut self, reply: &ModelReply) {
        if reply.action.is_empty() {
            return;
        }
        let params = Value::Object(reply.action_params.clone());
        let Some(result) = self.executor.execute(&reply.action, params.clone()).await else {
            return;
        };
        let text = match result {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e),
        };
        self.send_event(TurnEvent::ActionExecuted {
            action: reply.action.clone(),
            params,
            result: text.clone(),
        });
        if text.is_empty() {
            return;
        }

        if reply.action == SEARCH_ACTION {
            self.session.history_mut().push_search_result(text);
            let index = self.session.search_history().len();
            tracing::debug!(index, "Search result added to search history");
            self.send_event(TurnEvent::SearchRecorded { index });
        } else {
            let content = format!("Action result: {}", text);
            self.session
                .history_mut()
                .push_message(Message::system(content.clone()));
            self.send_event(TurnEvent::ActionResultRecorded { content });
        }
    }

    /// 合法则前进；非法则强制进入 error 并告知用户，循环继续
    async fn apply_transition(
        &mut self,
        spec: &StateSpec,
        destination: &str,
        channel: &mut dyn UserChannel,
    ) {
        let from = self.session.current_state().to_string();
        match validate_transition(spec, destination, &self.definition) {
            TransitionDecision::Accepted => {
                tracing::info!("Transitioning from '{}' to '{}'", from, destination);
                self.session.set_current_state(destination);
                self.send_event(TurnEvent::Transition {
                    from,
                    to: destination.to_string(),
                });
            }
            TransitionDecision::Rejected(reason) => {
                let msg = format!(
                    "Error: Invalid transition from '{}' to '{}'",
                    from, destination
                );
                tracing::warn!(reason = ?reason, "{}", msg);
                channel.present_error(&msg).await;
                self.session.set_current_state(ERROR_STATE);
                self.send_event(TurnEvent::InvalidTransition {
                    from,
                    to: destination.to_string(),
                    reason,
                });
            }
        }
    }
}
