//! Prompt 组装
//!
//! system 上下文按固定顺序拼接：role、state_machine_logic、work_principles、当前状态、
//! 搜索历史块（非空时）、当前状态的 prompt。其后接完整主对话，不截断、不摘要。
//! 纯函数：会话与定义不变时输出逐字节相同。

use crate::fsm::definition::{AgentDefinition, StateSpec};
use crate::fsm::session::AgentSession;
use crate::memory::Message;

/// 组装当前回合的 system 文本
pub fn compose_system_prompt(
    definition: &AgentDefinition,
    state: &StateSpec,
    session: &AgentSession,
) -> String {
    let description = &definition.description;
    format!(
        "\n{}\n\n{}\n\n{}\n\nCURRENT STATE: {}\n{}\n{}\n",
        description.role,
        description.state_machine_logic,
        description.work_principles,
        session.current_state(),
        session.history().search().render(),
        state.prompt,
    )
}

/// 发往模型的完整消息序列：[system] + 主对话
pub fn build_messages(system: String, session: &AgentSession) -> Vec<Message> {
    let conversation = session.conversation();
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(Message::system(system));
    messages.extend(conversation.iter().cloned());
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::definition::Description;
    use crate::memory::Role;

    fn definition() -> AgentDefinition {
        AgentDefinition::new("start")
            .with_description(Description {
                role: "ROLE".to_string(),
                state_machine_logic: "LOGIC".to_string(),
                work_principles: "PRINCIPLES".to_string(),
            })
            .with_state("start", StateSpec::new("STATE PROMPT"))
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let def = definition();
        let session = AgentSession::new("start");
        let system = compose_system_prompt(&def, def.state("start").unwrap(), &session);

        let positions: Vec<usize> = ["ROLE", "LOGIC", "PRINCIPLES", "CURRENT STATE: start", "STATE PROMPT"]
            .iter()
            .map(|needle| system.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!system.contains("SEARCH HISTORY"));
    }

    #[test]
    fn test_search_block_between_state_and_prompt() {
        let def = definition();
        let mut session = AgentSession::new("start");
        session.history_mut().push_search_result("first result");
        session.history_mut().push_search_result("second result");
        let system = compose_system_prompt(&def, def.state("start").unwrap(), &session);

        let state_pos = system.find("CURRENT STATE").unwrap();
        let block_pos = system.find("SEARCH HISTORY:").unwrap();
        let prompt_pos = system.find("STATE PROMPT").unwrap();
        assert!(state_pos < block_pos && block_pos < prompt_pos);
        assert!(system.contains("Search #1: first result"));
        assert!(system.contains("Search #2: second result"));
    }

    #[test]
    fn test_compose_is_idempotent() {
        let def = definition();
        let mut session = AgentSession::new("start");
        session.history_mut().push_message(Message::user("hello"));
        session.history_mut().push_search_result("r");
        let spec = def.state("start").unwrap();
        assert_eq!(
            compose_system_prompt(&def, spec, &session),
            compose_system_prompt(&def, spec, &session)
        );
    }

    #[test]
    fn test_messages_replay_full_conversation() {
        let mut session = AgentSession::new("start");
        session.history_mut().push_message(Message::user("u1"));
        session.history_mut().push_message(Message::assistant("a1"));
        session.history_mut().push_message(Message::system("Action result: 42"));
        session.history_mut().push_search_result("never a turn");

        let messages = build_messages("SYS".to_string(), &session);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::system("SYS"));
        assert_eq!(&messages[1..], session.conversation());
        assert!(messages.iter().all(|m| !m.content.contains("never a turn")));
        assert_eq!(messages.iter().filter(|m| m.role == Role::System).count(), 2);
    }
}
