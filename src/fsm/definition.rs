//! 智能体定义：状态机配置（agent_config.toml）
//!
//! ```toml
//! initial_state = "start"
//!
//! [description]
//! role = "You are a helpful research assistant."
//! state_machine_logic = "..."
//! work_principles = "..."
//!
//! [states.start]
//! prompt = "Greet the user and find out what they need."
//! temperature = 0.7
//! model = "llama3-70b-8192"
//! transitions = ["research", "exit"]
//! ```
//!
//! 会话期间只读；`initial_state` 必须是 `states` 中的键，由 validate 在加载时检查。

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::AgentError;

/// 终止哨兵：next_state 为此值（或空串）时结束会话
pub const EXIT_STATE: &str = "exit";
/// 错误哨兵：模型调用失败或非法转移时强制进入的状态
pub const ERROR_STATE: &str = "error";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

fn default_initial_state() -> String {
    "start".to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// [description] 段：每次都原样拼进 system 上下文
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub state_machine_logic: String,
    #[serde(default)]
    pub work_principles: String,
}

/// 单个状态：提示词模板、模型参数与允许的后继状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpec {
    pub prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// 未设置时使用应用配置中的默认模型
    #[serde(default)]
    pub model: Option<String>,
    /// 为空表示可转移到任意已定义状态
    #[serde(default)]
    pub transitions: Vec<String>,
}

impl StateSpec {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            model: None,
            transitions: Vec::new(),
        }
    }

    pub fn with_transitions<I, S>(mut self, transitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transitions = transitions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model_or<'a>(&'a self, default_model: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default_model)
    }
}

/// 智能体定义根
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    #[serde(default = "default_initial_state")]
    pub initial_state: String,
    #[serde(default)]
    pub description: Description,
    #[serde(default)]
    pub states: BTreeMap<String, StateSpec>,
}

impl AgentDefinition {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            initial_state: initial_state.into(),
            description: Description::default(),
            states: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = description;
        self
    }

    pub fn with_state(mut self, id: impl Into<String>, spec: StateSpec) -> Self {
        self.states.insert(id.into(), spec);
        self
    }

    pub fn state(&self, id: &str) -> Option<&StateSpec> {
        self.states.get(id)
    }

    pub fn contains_state(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    /// 解析并校验 TOML 文本
    pub fn from_toml_str(s: &str) -> Result<Self, AgentError> {
        let definition: Self =
            toml::from_str(s).map_err(|e| AgentError::ConfigError(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// 从文件加载并校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AgentError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let definition = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            initial_state = %definition.initial_state,
            states = definition.states.len(),
            "Agent definition loaded"
        );
        Ok(definition)
    }

    /// initial_state 必须存在；指向未定义状态的转移只告警（运行时会被判为非法转移）
    pub fn validate(&self) -> Result<(), AgentError> {
        if !self.contains_state(&self.initial_state) {
            return Err(AgentError::ConfigError(format!(
                "initial_state '{}' is not defined in [states]",
                self.initial_state
            )));
        }
        for (id, spec) in &self.states {
            for target in &spec.transitions {
                if target != EXIT_STATE && !self.contains_state(target) {
                    tracing::warn!(state = %id, target = %target, "transition target is not a defined state");
                }
            }
        }
        if !self.contains_state(ERROR_STATE) {
            tracing::warn!("no '{}' state defined; model failures and invalid transitions will end the session", ERROR_STATE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
initial_state = "start"

[description]
role = "R"
state_machine_logic = "L"
work_principles = "W"

[states.start]
prompt = "P"
transitions = ["middle"]

[states.middle]
prompt = "Q"
temperature = 0.2
model = "gpt-4o-mini"
transitions = ["start", "exit"]

[states.error]
prompt = "Apologize."
"#;

    #[test]
    fn test_parse_with_defaults() {
        let def = AgentDefinition::from_toml_str(SAMPLE).unwrap();
        assert_eq!(def.initial_state, "start");
        assert_eq!(def.description.role, "R");

        let start = def.state("start").unwrap();
        assert_eq!(start.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(start.model_or("fallback"), "fallback");
        assert_eq!(start.transitions, vec!["middle".to_string()]);

        let middle = def.state("middle").unwrap();
        assert_eq!(middle.temperature, 0.2);
        assert_eq!(middle.model_or("fallback"), "gpt-4o-mini");

        assert!(def.state("error").unwrap().transitions.is_empty());
    }

    #[test]
    fn test_initial_state_defaults_to_start() {
        let def = AgentDefinition::from_toml_str("[states.start]\nprompt = \"hi\"\n").unwrap();
        assert_eq!(def.initial_state, "start");
        assert_eq!(def.description, Description::default());
    }

    #[test]
    fn test_missing_initial_state_is_rejected() {
        let err = AgentDefinition::from_toml_str(
            "initial_state = \"nowhere\"\n[states.start]\nprompt = \"hi\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(ref msg) if msg.contains("nowhere")));
    }

    #[test]
    fn test_state_without_prompt_is_rejected() {
        let err = AgentDefinition::from_toml_str("[states.start]\ntemperature = 0.1\n").unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let def = AgentDefinition::load(&path).unwrap();
        assert_eq!(def.state_names().collect::<Vec<_>>(), vec!["error", "middle", "start"]);

        let missing = AgentDefinition::load(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(AgentError::ConfigError(_))));
    }
}
