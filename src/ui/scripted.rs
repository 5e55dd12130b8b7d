//! 脚本化通道：按顺序提供用户输入，记录展示给用户的内容

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::ui::UserChannel;

#[derive(Debug, Default)]
pub struct ScriptedChannel {
    inputs: VecDeque<String>,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
    /// read_input 被调用的次数（含输入耗尽时的那次）
    pub input_requests: usize,
}

impl ScriptedChannel {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn remaining_inputs(&self) -> usize {
        self.inputs.len()
    }
}

#[async_trait]
impl UserChannel for ScriptedChannel {
    async fn present_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    async fn present_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    async fn read_input(&mut self) -> Option<String> {
        self.input_requests += 1;
        self.inputs.pop_front()
    }
}
