use crate::Result;
use crate::callbacks::Callback;
use crate::llm::{CompletionRequest, LLM, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// The system prompt and the user's goal are never summarized away.
const PINNED: usize = 2;

/// Conversation memory with a token budget: once the history grows past
/// `max_tokens`, everything between the pinned prompt and the most recent
/// `keep_last` messages is replaced by a model-written summary.
pub struct SummaryBufferMemory {
    llm: Arc<dyn LLM + Send + Sync>,
    keep_last: usize,
    max_tokens: usize,
}

impl SummaryBufferMemory {
    pub fn new(
        llm: Arc<dyn LLM + Send + Sync>,
        keep_last: usize,
        max_tokens: usize,
    ) -> Box<Self> {
        Box::new(Self {
            llm,
            keep_last: keep_last.max(1),
            max_tokens,
        })
    }

    pub fn ntokens(messages: &[Message]) -> usize {
        messages.iter().map(Message::ntokens).sum()
    }

    /// First index of the tail that is kept verbatim. Tool results stay
    /// together with the assistant message that requested them.
    fn split_point(&self, messages: &[Message]) -> usize {
        let mut split = messages.len().saturating_sub(self.keep_last).max(PINNED);
        while split > PINNED && matches!(messages.get(split), Some(Message::Tool { .. })) {
            split -= 1;
        }
        split
    }

    pub async fn summarize_history(&self, mut messages: Vec<Message>) -> Result<Vec<Message>> {
        let split = self.split_point(&messages);
        if split <= PINNED {
            return Ok(messages);
        }

        let last_messages = messages.split_off(split);

        messages.push(Message::User(PROMPT.to_string()));

        let result = self
            .llm
            .completion(CompletionRequest {
                messages: &messages,
                tools: &[],
            })
            .await?;

        tracing::debug!(
            summarized = messages.len() - PINNED - 1,
            kept = last_messages.len(),
            "compacted conversation memory"
        );

        messages.truncate(PINNED);
        messages.push(Message::System(format!(
            "Summary of the research so far:\n{}",
            result.content
        )));
        messages.extend(last_messages);

        Ok(messages)
    }
}

const PROMPT: &str = "In order to keep the conversational history from becoming too long, you must generate a summary of the current chat history.
Instructions:
- The summary must compress the information, be as succinct as possible. The final summary should not be more than 1000 words in length.
- Preserve every fact you gathered together with the url or search result it came from, these are needed to cite sources in the final answer.
- Remember that you are a researcher, make sure to preserve any key findings or information that you will need to complete the task.";

#[async_trait]
impl Callback for SummaryBufferMemory {
    async fn call(&mut self, messages: Vec<Message>) -> Result<Vec<Message>> {
        if Self::ntokens(&messages) > self.max_tokens {
            return self.summarize_history(messages).await;
        }
        Ok(messages)
    }
}
