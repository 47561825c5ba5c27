use crate::Result;
use crate::llm::Message;
use async_trait::async_trait;

mod summary_memory;
pub use summary_memory::SummaryBufferMemory;

mod tracer;
pub use tracer::TranscriptTracer;

/// Runs after every agent step and may rewrite the history.
#[async_trait]
pub trait Callback {
    async fn call(&mut self, messages: Vec<Message>) -> Result<Vec<Message>>;
}
