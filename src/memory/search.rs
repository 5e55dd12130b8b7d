//! 搜索历史
//!
//! search 动作的结果单独存放，渲染为 system 上下文中的 SEARCH HISTORY 块，从不进入主对话。

/// 搜索结果日志（只追加）
#[derive(Clone, Debug, Default)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: impl Into<String>) {
        self.entries.push(result.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 渲染为 system 上下文中的独立块；为空时返回空串
    ///
    /// 每条结果标注 `Search #n`（从 1 开始）。
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut block = String::from("\n\nSEARCH HISTORY:\n");
        for (idx, result) in self.entries.iter().enumerate() {
            block.push_str(&format!("Search #{}: {}\n\n", idx + 1, result));
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_is_blank() {
        assert_eq!(SearchHistory::new().render(), "");
    }

    #[test]
    fn test_render_labels_are_one_based() {
        let mut history = SearchHistory::new();
        history.push("rust lang");
        history.push("tokio docs");
        let block = history.render();
        assert!(block.starts_with("\n\nSEARCH HISTORY:\n"));
        assert!(block.contains("Search #1: rust lang\n"));
        assert!(block.contains("Search #2: tokio docs\n"));
        assert!(!block.contains("Search #0"));
    }
}
