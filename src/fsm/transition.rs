//! 状态转移校验（纯函数）
//!
//! 目标状态必须已定义；当前状态的 transitions 非空时还必须出现在其中。
//! transitions 为空是开放策略：可转移到任意已定义状态，而不是禁止转移。

use serde::Serialize;

use crate::fsm::definition::{AgentDefinition, StateSpec};

/// 拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// 目标状态未在配置中定义
    UnknownState,
    /// 目标状态不在当前状态的允许列表中
    NotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    Accepted,
    Rejected(RejectReason),
}

impl TransitionDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TransitionDecision::Accepted)
    }
}

/// 判断从 current 到 destination 的转移是否合法
pub fn validate_transition(
    current: &StateSpec,
    destination: &str,
    definition: &AgentDefinition,
) -> TransitionDecision {
    if !definition.contains_state(destination) {
        return TransitionDecision::Rejected(RejectReason::UnknownState);
    }
    if current.transitions.is_empty() || current.transitions.iter().any(|t| t == destination) {
        TransitionDecision::Accepted
    } else {
        TransitionDecision::Rejected(RejectReason::NotAllowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> AgentDefinition {
        AgentDefinition::new("start")
            .with_state("start", StateSpec::new("P").with_transitions(["middle"]))
            .with_state("middle", StateSpec::new("Q"))
            .with_state("error", StateSpec::new("E"))
    }

    #[test]
    fn test_closed_list_only_allows_listed() {
        let def = definition();
        let start = def.state("start").unwrap();
        assert_eq!(validate_transition(start, "middle", &def), TransitionDecision::Accepted);
        assert_eq!(
            validate_transition(start, "error", &def),
            TransitionDecision::Rejected(RejectReason::NotAllowed)
        );
        assert_eq!(
            validate_transition(start, "start", &def),
            TransitionDecision::Rejected(RejectReason::NotAllowed)
        );
    }

    #[test]
    fn test_empty_list_allows_any_known_state() {
        let def = definition();
        let middle = def.state("middle").unwrap();
        for target in def.state_names() {
            assert!(validate_transition(middle, target, &def).is_accepted(), "{target}");
        }
    }

    #[test]
    fn test_unknown_destination_always_rejected() {
        let def = definition().with_state(
            "open",
            StateSpec::new("O").with_transitions(["ghost"]),
        );
        for state in ["middle", "open"] {
            let spec = def.state(state).unwrap();
            assert_eq!(
                validate_transition(spec, "ghost", &def),
                TransitionDecision::Rejected(RejectReason::UnknownState)
            );
            assert_eq!(
                validate_transition(spec, "", &def),
                TransitionDecision::Rejected(RejectReason::UnknownState)
            );
        }
    }
}
