use crate::splitter::TextSplitter;
use agent::Result;
use agent::llm::{CompletionRequest, LLM, Message};
use std::sync::Arc;

/// Rounds of re-summarizing chunk summaries that still do not fit in one chunk.
const MAX_COLLAPSE_ROUNDS: usize = 3;

pub fn summary_prompt(objective: &str, text: &str) -> String {
    format!("Write a summary of the following text for {objective}:\n\"{text}\"\nSUMMARY:")
}

/// Map-reduce summarization: every chunk is summarized on its own, then the
/// chunk summaries are summarized together with the same prompt.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LLM + Send + Sync>,
    splitter: TextSplitter,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LLM + Send + Sync>, splitter: TextSplitter) -> Self {
        Self { llm, splitter }
    }

    pub async fn summarize(&self, objective: &str, content: &str) -> Result<String> {
        let chunks = self.splitter.split_text(content);
        tracing::info!(
            objective,
            chars = content.chars().count(),
            chunks = chunks.len(),
            "summarizing content"
        );

        let mut combined = self.map(objective, &chunks).await?.join("\n\n");

        let mut round = 0;
        while round < MAX_COLLAPSE_ROUNDS
            && combined.chars().count() > self.splitter.chunk_size()
        {
            let chunks = self.splitter.split_text(&combined);
            tracing::debug!(round, chunks = chunks.len(), "collapsing chunk summaries");
            combined = self.map(objective, &chunks).await?.join("\n\n");
            round += 1;
        }

        self.prompt(objective, &combined).await
    }

    async fn map(&self, objective: &str, chunks: &[String]) -> Result<Vec<String>> {
        let mut summaries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            summaries.push(self.prompt(objective, chunk).await?);
        }
        Ok(summaries)
    }

    async fn prompt(&self, objective: &str, text: &str) -> Result<String> {
        let messages = [Message::User(summary_prompt(objective, text))];

        let response = self
            .llm
            .completion(CompletionRequest {
                messages: &messages,
                tools: &[],
            })
            .await?;

        Ok(response.content)
    }
}
