use crate::summarize::Summarizer;
use agent::llm::Message;
use agent::tools::{FunctionalTool, ToolCall, ToolDefinition};
use async_trait::async_trait;
use reqwest::StatusCode;
use schemars::JsonSchema;
use scraper::{ElementRef, Html, Node};
use serde::Deserialize;
use thiserror::Error;

/// Elements whose text is never rendered.
const HIDDEN_ELEMENTS: [&str; 5] = ["head", "script", "style", "noscript", "template"];

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("http request failed with status code {status}, details: {body}")]
    Status { status: u16, body: String },

    #[error("scrape request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("summarization failed: {0}")]
    Summarize(#[from] agent::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapedPage {
    /// The visible text of the page, unchanged.
    Verbatim(String),
    /// A summary of a page too long to return whole.
    Summarized(String),
}

impl ScrapedPage {
    pub fn into_text(self) -> String {
        match self {
            ScrapedPage::Verbatim(text) | ScrapedPage::Summarized(text) => text,
        }
    }
}

/// All text a browser would render, concatenated in document order with no
/// markup or added structure.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);
    text
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Fetches pages through a headless browser rendering service that takes
/// `{"url": ...}` and authenticates with a `token` query parameter.
#[derive(Clone)]
pub struct ScrapeClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    summarizer: Summarizer,
    summary_threshold: usize,
}

impl ScrapeClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        summarizer: Summarizer,
        summary_threshold: usize,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            summarizer,
            summary_threshold,
        }
    }

    /// Pages with more than `summary_threshold` characters of visible text
    /// are summarized for `objective`, shorter ones are returned verbatim.
    pub async fn scrape_website(
        &self,
        objective: &str,
        url: &str,
    ) -> Result<ScrapedPage, ScrapeError> {
        tracing::info!(url, "scraping website");

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .json(&serde_json::json!({ "url": url }));

        if let Some(token) = &self.api_key {
            request = request.query(&[("token", token)]);
        }

        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                url,
                status = status.as_u16(),
                details = %body,
                "http request failed"
            );
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = visible_text(&response.text().await?);
        let chars = text.chars().count();
        tracing::info!(url, chars, content = %text, "content from website");

        if chars > self.summary_threshold {
            let summary = self.summarizer.summarize(objective, &text).await?;
            Ok(ScrapedPage::Summarized(summary))
        } else {
            Ok(ScrapedPage::Verbatim(text))
        }
    }
}

#[derive(Deserialize, JsonSchema)]
struct ScrapeArgs {
    /// what you want to learn from the page, used to focus its summary
    objective: String,
    /// the url to scrape, taken from search results
    url: String,
}

pub struct ScrapeTool {
    client: ScrapeClient,
}

impl ScrapeTool {
    pub fn new(client: ScrapeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionalTool for ScrapeTool {
    fn definition(&self) -> agent::Result<ToolDefinition> {
        ToolDefinition::new::<ScrapeArgs>(
            "scrape_website",
            "useful when you need to get data from a website url, passing both url and objective to the function; DO NOT make up any url, the url should only be from the search results",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> agent::Result<Message> {
        let args: ScrapeArgs = call.args()?;

        let result = match self.client.scrape_website(&args.objective, &args.url).await {
            Ok(page) => page.into_text(),
            Err(err) => format!("failed to scrape {}: {}", args.url, err),
        };

        Ok(call.reply(result))
    }
}
