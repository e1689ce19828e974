// src/sources/news.rs
//! Bing News Search provider. Returns `"{title} — {description}"` snippets;
//! articles with neither field are skipped.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use super::{snippet_from, HeadlineProvider};
use crate::error::LensError;

const BING_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/news/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

pub struct BingNewsProvider {
    http: reqwest::Client,
    api_key: String,
    market: String,
}

impl BingNewsProvider {
    pub fn new(api_key: impl Into<String>, market: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("fx-lens/0.1 (+github.com/lumlich/fx-lens)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.into(),
            market: market.into(),
        }
    }

    /// Reads `BING_API_KEY` from the environment.
    pub fn from_env(market: impl Into<String>) -> Result<Self, LensError> {
        let key = std::env::var("BING_API_KEY").map_err(|_| LensError::MissingApiKey("bing"))?;
        Ok(Self::new(key, market))
    }
}

#[async_trait]
impl HeadlineProvider for BingNewsProvider {
    async fn fetch(&self, query: &str, count: u32) -> Result<Vec<String>, LensError> {
        let resp = self
            .http
            .get(BING_ENDPOINT)
            .query(&[
                ("q", query.to_string()),
                ("count", count.to_string()),
                ("mkt", self.market.clone()),
                ("safeSearch", "Off".to_string()),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LensError::Transport(format!(
                "news search returned HTTP {}",
                resp.status()
            )));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| LensError::MalformedResponse(e.to_string()))?;

        let snippets = snippets_from_response(&body);
        counter!("headlines_fetched_total").increment(snippets.len() as u64);
        Ok(snippets)
    }

    fn name(&self) -> &'static str {
        "bing-news"
    }
}

fn snippets_from_response(body: &SearchResponse) -> Vec<String> {
    body.value
        .iter()
        .filter_map(|a| {
            let name = a.name.as_deref().unwrap_or_default();
            let description = a.description.as_deref().unwrap_or_default();
            if name.trim().is_empty() && description.trim().is_empty() {
                return None;
            }
            Some(snippet_from(name, description))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_mapping_skips_fully_empty_articles() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"value": [
                {"name": "USD weakens on jobs data", "description": "Payrolls miss estimates."},
                {"name": "", "description": ""},
                {"description": "Standalone description without a title."}
            ]}"#,
        )
        .unwrap();

        let snippets = snippets_from_response(&body);
        assert_eq!(snippets.len(), 2);
        assert_eq!(
            snippets[0],
            "USD weakens on jobs data — Payrolls miss estimates."
        );
    }

    #[test]
    fn missing_value_field_parses_as_empty() {
        let body: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(body.value.is_empty());
    }
}
