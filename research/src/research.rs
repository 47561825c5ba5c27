use crate::scrape::{ScrapeClient, ScrapeTool};
use crate::search::{SearchClient, SearchTool};
use crate::{Error, Result};
use agent::callbacks::{SummaryBufferMemory, TranscriptTracer};
use agent::llm;
use agent::llm::Message;
use agent::{Agent, AgentBuilder, FinalAnswer};
use std::sync::Arc;

const RESEARCHER_PROMPT: &str = include_str!("prompts/researcher.md");

/// Messages the memory never folds into its summary.
const KEEP_LAST: usize = 2;

/// Builds a fresh agent, with its own memory, for every research goal.
pub struct Researcher {
    llm: Arc<dyn llm::LLM + Send + Sync>,
    search: SearchClient,
    scrape: ScrapeClient,
    max_steps: usize,
    memory_tokens: usize,
}

impl Researcher {
    pub fn new(
        llm: Arc<dyn llm::LLM + Send + Sync>,
        search: SearchClient,
        scrape: ScrapeClient,
        max_steps: usize,
        memory_tokens: usize,
    ) -> Self {
        Self {
            llm,
            search,
            scrape,
            max_steps,
            memory_tokens,
        }
    }

    fn agent(&self) -> Result<Agent> {
        Ok(AgentBuilder::new()
            .llm(self.llm.clone())
            .tool(Box::new(SearchTool::new(self.search.clone())))
            .tool(Box::new(ScrapeTool::new(self.scrape.clone())))
            .callback(SummaryBufferMemory::new(
                self.llm.clone(),
                KEEP_LAST,
                self.memory_tokens,
            ))
            .callback(TranscriptTracer::new("researcher"))
            .stop_condition(Box::new(FinalAnswer))
            .max_steps(self.max_steps)
            .build()?)
    }

    pub async fn research(&self, goal: &str) -> Result<String> {
        tracing::info!(goal, "starting research");

        let history = self
            .agent()?
            .run(vec![
                Message::System(RESEARCHER_PROMPT.to_string()),
                Message::User(goal.to_string()),
            ])
            .await?;

        match history.last() {
            Some(Message::Assistant(answer, _)) => {
                tracing::info!(goal, steps = history.len(), "research finished");
                Ok(answer.clone())
            }
            _ => Err(Error::NoAnswer),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::Researcher;
    use crate::scrape::ScrapeClient;
    use crate::search::SearchClient;
    use crate::splitter::TextSplitter;
    use crate::summarize::Summarizer;
    use agent::llm::{CompletionRequest, CompletionResponse, LLM, Message};
    use agent::tools::ToolCall;
    use async_trait::async_trait;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Searches, scrapes the first result, then answers with what it read.
    pub(crate) struct ScriptedLLM;

    fn tool_results(messages: &[Message]) -> Vec<&str> {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::Tool { result, .. } => Some(result.as_str()),
                _ => None,
            })
            .collect()
    }

    #[async_trait]
    impl LLM for ScriptedLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> agent::Result<CompletionResponse> {
            assert!(matches!(&request.messages[0], Message::System(_)));
            let results = tool_results(request.messages);

            let call = |name: &str, args: serde_json::Value| CompletionResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: format!("call_{}", results.len()),
                    name: name.to_string(),
                    args: args.to_string(),
                }],
            };

            Ok(match results.len() {
                0 => call("search", serde_json::json!({ "query": "rust 2024 edition" })),
                1 => call(
                    "scrape_website",
                    serde_json::json!({
                        "objective": "what changed",
                        "url": "https://blog.rust-lang.org/2025/02/20/Rust-1.85.0.html",
                    }),
                ),
                _ => CompletionResponse {
                    content: format!(
                        "{}\n\nSources: https://blog.rust-lang.org/2025/02/20/Rust-1.85.0.html",
                        results[1]
                    ),
                    tool_calls: vec![],
                },
            })
        }
    }

    pub(crate) fn researcher(
        server_uri: &str,
        llm: Arc<dyn LLM + Send + Sync>,
        max_steps: usize,
    ) -> Researcher {
        let http = reqwest::Client::new();
        Researcher::new(
            llm.clone(),
            SearchClient::new(
                http.clone(),
                format!("{}/search", server_uri),
                Some("search-key".to_string()),
            ),
            ScrapeClient::new(
                http,
                format!("{}/content", server_uri),
                Some("browser-key".to_string()),
                Summarizer::new(llm, TextSplitter::new(10_000, 500)),
                10_000,
            ),
            max_steps,
            100_000,
        )
    }

    #[tokio::test]
    async fn test_search_scrape_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(serde_json::json!({ "q": "rust 2024 edition" })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"organic":[{"link":"https://blog.rust-lang.org/2025/02/20/Rust-1.85.0.html"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<p>Rust 1.85.0 stabilizes the 2024 edition.</p>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let answer = researcher(&server.uri(), Arc::new(ScriptedLLM), 15)
            .research("What is new in the Rust 2024 edition?")
            .await
            .unwrap();

        assert!(answer.starts_with("Rust 1.85.0 stabilizes the 2024 edition."));
        assert!(answer.contains("Sources: https://blog.rust-lang.org"));
    }

    #[tokio::test]
    async fn test_failed_scrape_does_not_abort_research() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let answer = researcher(&server.uri(), Arc::new(ScriptedLLM), 15)
            .research("anything")
            .await
            .unwrap();

        assert!(answer.starts_with("failed to scrape https://blog.rust-lang.org"));
    }
}
