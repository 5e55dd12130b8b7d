//! 动作注册表
//!
//! 所有动作实现 Action trait（name / description / execute），由 ActionRegistry 按名注册与查找；
//! 同名重复注册时后者覆盖前者，查找不存在的名字既不调用也不报错。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// 动作 trait：LLM 在回复中以 `action` 字段点名，参数来自 `action_params`（JSON 对象）
///
/// 返回空串表示「无结果」，不会写入任何历史。
#[async_trait]
pub trait Action: Send + Sync {
    /// 动作名称（对应回复 JSON 中的 "action" 字段）
    fn name(&self) -> &str;

    /// 动作描述（写进配置的 prompt 中供 LLM 理解，本身不参与调度）
    fn description(&self) -> &str;

    async fn execute(&self, params: Value) -> Result<String, String>;
}

/// 把一个同步闭包包装成 Action，便于在启动时注册简单能力
pub struct FnAction<F> {
    name: String,
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn(&Value) -> String + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Action for FnAction<F>
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        ""
    }

    async fn execute(&self, params: Value) -> Result<String, String> {
        Ok((self.func)(&params))
    }
}

/// 动作注册表：按名称存储 Arc<dyn Action>
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以动作自身的 name() 注册
    pub fn register(&mut self, action: impl Action + 'static) {
        let name = action.name().to_string();
        self.register_as(name, action);
    }

    /// 以指定名字注册（同一实现可挂在多个名字下）
    pub fn register_as(&mut self, name: impl Into<String>, action: impl Action + 'static) {
        let name = name.into();
        if self.actions.insert(name.clone(), Arc::new(action)).is_some() {
            tracing::debug!(action = %name, "action re-registered, previous one replaced");
        } else {
            tracing::info!(action = %name, "Registered action");
        }
    }

    /// 注册一个同步闭包
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        self.register_as(name.clone(), FnAction::new(name, func));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// 查找并调用；名字未注册时返回 None
    pub async fn dispatch(&self, name: &str, params: Value) -> Option<Result<String, String>> {
        let action = self.actions.get(name)?;
        Some(action.execute(params).await)
    }

    pub fn action_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }

    /// (名称, 描述) 列表，按名称排序；供编写状态提示词时查阅
    pub fn descriptions(&self) -> Vec<(String, String)> {
        let mut list: Vec<(String, String)> = self
            .actions
            .iter()
            .map(|(name, action)| (name.clone(), action.description().to_string()))
            .collect();
        list.sort();
        list
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
