//! Search 动作：通过 SearxNG JSON API 做网页搜索
//!
//! POST `q=<query>&format=json` 到配置的端点，取前 N 条结果格式化为纯文本。
//! 失败时返回描述性的 `Error: ...` 文本而不是 Err，与其他搜索结果一样进入搜索历史，让 LLM 自行决定下一步。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::tools::Action;

/// Search 动作：SearxNG 端点、返回条数上限
pub struct SearchTool {
    client: Client,
    endpoint: String,
    max_results: usize,
}

impl SearchTool {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64, max_results: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            max_results,
        }
    }

    async fn search(&self, query: &str) -> String {
        let form = [("q", query), ("format", "json")];
        let resp = match self.client.post(&self.endpoint).form(&form).send().await {
            Ok(resp) => resp,
            Err(e) => return format!("Error performing search: {}", e),
        };
        if !resp.status().is_success() {
            return format!(
                "Error: Could not complete search. Status code: {}",
                resp.status().as_u16()
            );
        }
        match resp.json::<Value>().await {
            Ok(body) => format_results(query, &body, self.max_results),
            Err(e) => format!("Error performing search: {}", e),
        }
    }
}

/// 将 SearxNG 响应格式化为编号列表，末尾附总条数
pub fn format_results(query: &str, body: &Value, max_results: usize) -> String {
    let results = match body.get("results").and_then(|r| r.as_array()) {
        Some(results) if !results.is_empty() => results,
        _ => return format!("No results found for query: {}", query),
    };

    let field = |result: &Value, key: &str, fallback: &str| -> String {
        result
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(fallback)
            .trim()
            .to_string()
    };

    let mut out = String::from("Search Results:\n\n");
    for (i, result) in results.iter().take(max_results).enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, field(result, "title", "No Title")));
        out.push_str(&format!("   URL: {}\n", field(result, "url", "No URL")));
        out.push_str(&format!(
            "   Description: {}\n\n",
            field(result, "content", "No Description")
        ));
    }
    out.push_str(&format!("Total results found: {}", results.len()));
    out
}

#[async_trait]
impl Action for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web via SearxNG. Params: {\"query\": \"...\"}"
    }

    async fn execute(&self, params: Value) -> Result<String, String> {
        let query = params
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if query.is_empty() {
            return Ok("Error: No search query provided.".to_string());
        }
        tracing::info!(query = %query, "search action");
        Ok(self.search(query).await)
    }
}
