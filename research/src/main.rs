mod config;
mod error;
mod logging;
mod research;
mod scrape;
mod search;
mod splitter;
mod summarize;
mod ui;

pub use error::{Error, Result};

use agent::llm::{LLM, OpenAI};
use clap::Parser;
use config::Config;
use research::Researcher;
use scrape::ScrapeClient;
use search::SearchClient;
use splitter::TextSplitter;
use std::sync::Arc;
use summarize::Summarizer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    let _guard = logging::init(&config)?;

    if config.serp_api_key.is_none() {
        tracing::warn!("SERP_API_KEY is not set, search requests will be unauthenticated");
    }
    if config.browserless_api_key.is_none() {
        tracing::warn!("BROWSERLESS_API_KEY is not set, scrape requests will be unauthenticated");
    }

    let llm: Arc<dyn LLM + Send + Sync> =
        OpenAI::with_config(config.model.clone(), config.openai_config(), Some(0.0));

    let summary_llm: Arc<dyn LLM + Send + Sync> = match &config.summary_model {
        Some(model) => OpenAI::with_config(model.clone(), config.openai_config(), Some(0.0)),
        None => llm.clone(),
    };

    let http = reqwest::Client::new();
    let summarizer = Summarizer::new(
        summary_llm,
        TextSplitter::new(config.chunk_size, config.chunk_overlap),
    );
    let search = SearchClient::new(
        http.clone(),
        config.search_endpoint.clone(),
        config.serp_api_key.clone(),
    );
    let scrape = ScrapeClient::new(
        http,
        config.scrape_endpoint.clone(),
        config.browserless_api_key.clone(),
        summarizer,
        config.summary_threshold,
    );

    let researcher = Researcher::new(
        llm,
        search,
        scrape,
        config.max_steps,
        config.memory_tokens,
    );

    tracing::info!(model = %config.model, "starting research assistant");
    ui::serve(config.bind, ui::router(Arc::new(researcher))).await
}
