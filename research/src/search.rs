use agent::llm::Message;
use agent::tools::{FunctionalTool, ToolCall, ToolDefinition};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Client for a Google search API that takes `{"q": ...}` and authenticates
/// with an `X-API-KEY` header.
#[derive(Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SearchClient {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// Returns the raw response body, unparsed. Every call is a fresh request.
    pub async fn search(&self, query: &str) -> Result<String, SearchError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "q": query }));

        if let Some(api_key) = &self.api_key {
            request = request.header("X-API-KEY", api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(query, %status, "search api returned an error status");
        }
        tracing::info!(query, response = %body, "search response");

        Ok(body)
    }
}

#[derive(Deserialize, JsonSchema)]
struct SearchArgs {
    /// a targeted search query
    query: String,
}

pub struct SearchTool {
    client: SearchClient,
}

impl SearchTool {
    pub fn new(client: SearchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionalTool for SearchTool {
    fn definition(&self) -> agent::Result<ToolDefinition> {
        ToolDefinition::new::<SearchArgs>(
            "search",
            "useful for when you need to answer questions about current events, data. You should ask targeted questions",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> agent::Result<Message> {
        let args: SearchArgs = call.args()?;

        let result = match self.client.search(&args.query).await {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(query = %args.query, error = %err, "search failed");
                format!("search failed: {}", err)
            }
        };

        Ok(call.reply(result))
    }
}
