//! 记忆层：主对话历史与搜索历史
//!
//! HistoryStore 持有两条互相独立的只追加日志；PromptComposer 只读，写入只发生在 TurnOrchestrator 中。

pub mod conversation;
pub mod search;

pub use conversation::{ConversationMemory, Message, Role};
pub use search::SearchHistory;

/// 两类历史：主对话（逐条回放给 LLM）与搜索结果（渲染进 system 上下文）
#[derive(Clone, Debug, Default)]
pub struct HistoryStore {
    conversation: ConversationMemory,
    search: SearchHistory,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self) -> &ConversationMemory {
        &self.conversation
    }

    pub fn search(&self) -> &SearchHistory {
        &self.search
    }

    pub(crate) fn push_message(&mut self, msg: Message) {
        self.conversation.push(msg);
    }

    pub(crate) fn push_search_result(&mut self, result: impl Into<String>) {
        self.search.push(result);
    }
}
