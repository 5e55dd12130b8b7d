//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FSM_AGENT__*` 覆盖（双下划线表示嵌套，如 `FSM_AGENT__LLM__PROVIDER=mock`）。
//! 状态机本身（智能体定义）不在这里，见 `fsm::definition`。

use std::path::PathBuf;

use serde::Deserialize;

use crate::llm::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub actions: ActionsSection,
    pub audit: AuditSection,
}

/// [app] 段：智能体定义路径、dev 模式、初始输入、回合上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub agent_definition: PathBuf,
    /// 打开后日志级别为 debug，完整记录每次请求与原始回复
    pub dev_mode: bool,
    /// 会话开始时作为第一条 user 消息；空串表示不注入
    pub initial_input: Option<String>,
    pub max_turns: Option<usize>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            agent_definition: PathBuf::from("agent_config.toml"),
            dev_mode: false,
            initial_input: Some("Hello, I need some help.".to_string()),
            max_turns: None,
        }
    }
}

/// [llm] 段：后端选择、默认模型与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openrouter / openai / mock
    pub provider: String,
    pub base_url: Option<String>,
    /// 状态未指定 model 时使用
    pub default_model: String,
    pub max_tokens: u32,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            base_url: None,
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [actions] 段：单次动作超时与内置动作参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActionsSection {
    pub timeout_secs: u64,
    pub search: SearchSection,
}

impl Default for ActionsSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            search: SearchSection::default(),
        }
    }
}

/// [actions.search] 段：SearxNG 端点、超时、返回条数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_results: usize,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8888/search".to_string(),
            timeout_secs: 15,
            max_results: 5,
        }
    }
}

/// [audit] 段：是否写审计日志及目录
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("."),
        }
    }
}

/// 从 config 目录加载配置，环境变量 FSM_AGENT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FSM_AGENT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, ignoring");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FSM_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
