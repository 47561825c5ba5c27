use crate::{Error, Result};
use agent::llm::OpenAIConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// AI research agent: answers a research goal by searching, scraping and
/// summarizing web pages.
#[derive(Parser, Debug, Clone)]
#[command(name = "research", version)]
pub struct Config {
    /// Key for the search API, sent as the `X-API-KEY` header
    #[arg(long, env = "SERP_API_KEY", hide_env_values = true)]
    pub serp_api_key: Option<String>,

    /// Key for the headless browser API, sent as the `token` query parameter
    #[arg(long, env = "BROWSERLESS_API_KEY", hide_env_values = true)]
    pub browserless_api_key: Option<String>,

    #[arg(
        long,
        env = "RESEARCH_SEARCH_ENDPOINT",
        default_value = "https://google.serper.dev/search"
    )]
    pub search_endpoint: String,

    #[arg(
        long,
        env = "RESEARCH_SCRAPE_ENDPOINT",
        default_value = "https://chrome.browserless.io/content"
    )]
    pub scrape_endpoint: String,

    /// Chat model driving the agent
    #[arg(long, env = "RESEARCH_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Chat model used to summarize long pages, defaults to `--model`
    #[arg(long, env = "RESEARCH_SUMMARY_MODEL")]
    pub summary_model: Option<String>,

    /// Base url of an OpenAI compatible api
    #[arg(long, env = "OPENAI_API_BASE")]
    pub openai_api_base: Option<String>,

    #[arg(long, env = "RESEARCH_BIND", default_value = "127.0.0.1:8501")]
    pub bind: SocketAddr,

    #[arg(long, env = "RESEARCH_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    #[arg(long, env = "RESEARCH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum number of model completions per research run
    #[arg(long, default_value_t = 15)]
    pub max_steps: usize,

    /// Token budget of the conversation memory before it is summarized
    #[arg(long, default_value_t = 1000)]
    pub memory_tokens: usize,

    /// Scraped pages longer than this many characters are summarized
    #[arg(long, default_value_t = 10_000)]
    pub summary_threshold: usize,

    #[arg(long, default_value_t = 10_000)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = 500)]
    pub chunk_overlap: usize,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::ConfigError("chunk size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::ConfigError(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_steps == 0 {
            return Err(Error::ConfigError("max steps must be positive".to_string()));
        }
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|e| Error::ConfigError(format!("log level {}: {}", self.log_level, e)))?;
        Ok(())
    }

    /// Api key comes from `OPENAI_API_KEY`.
    pub fn openai_config(&self) -> OpenAIConfig {
        let config = OpenAIConfig::default();
        match &self.openai_api_base {
            Some(base) => config.with_api_base(base),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["research"]).unwrap();

        assert_eq!(config.search_endpoint, "https://google.serper.dev/search");
        assert_eq!(config.scrape_endpoint, "https://chrome.browserless.io/content");
        assert_eq!(config.summary_threshold, 10_000);
        assert_eq!(config.chunk_size, 10_000);
        assert_eq!(config.chunk_overlap, 500);
        assert_eq!(config.bind.port(), 8501);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_overlap_not_below_chunk_size() {
        let config =
            Config::try_parse_from(["research", "--chunk-size", "100", "--chunk-overlap", "100"])
                .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let config = Config::try_parse_from(["research", "--log-level", "loud"]).unwrap();

        assert!(config.validate().is_err());
    }
}
