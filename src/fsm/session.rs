//! 会话状态：当前状态、两类历史与回合计数
//!
//! 只由 TurnOrchestrator 持有并修改；对外只读。

use uuid::Uuid;

use crate::memory::{HistoryStore, Message};

#[derive(Debug, Clone)]
pub struct AgentSession {
    id: Uuid,
    current_state: String,
    history: HistoryStore,
    loop_count: usize,
}

impl AgentSession {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            current_state: initial_state.into(),
            history: HistoryStore::new(),
            loop_count: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn conversation(&self) -> &[Message] {
        self.history.conversation().messages()
    }

    pub fn search_history(&self) -> &[String] {
        self.history.search().entries()
    }

    /// 已开始的回合数（仅用于诊断）
    pub fn loop_count(&self) -> usize {
        self.loop_count
    }

    pub(crate) fn set_current_state(&mut self, state: impl Into<String>) {
        self.current_state = state.into();
    }

    pub(crate) fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub(crate) fn begin_loop(&mut self) -> usize {
        self.loop_count += 1;
        self.loop_count
    }
}
