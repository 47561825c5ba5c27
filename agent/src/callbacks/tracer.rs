use crate::Result;
use crate::callbacks::Callback;
use crate::llm::Message;
use async_trait::async_trait;

/// Emits every message added to the history since the previous step as a
/// tracing event, so the transcript of a run ends up in the log.
pub struct TranscriptTracer {
    name: String,
    last_hashes: Vec<u64>,
    step: u32,
}

impl TranscriptTracer {
    pub fn new(name: &str) -> Box<Self> {
        Box::new(Self {
            name: name.to_string(),
            last_hashes: Vec::new(),
            step: 0,
        })
    }

    /// Index of the first message not traced yet. After a rewrite this is
    /// the end of the prefix the two histories still share.
    fn first_unseen(&self, new_hashes: &[u64]) -> usize {
        new_hashes
            .iter()
            .zip(self.last_hashes.iter())
            .take_while(|&(a, b)| a == b)
            .count()
    }
}

#[async_trait]
impl Callback for TranscriptTracer {
    async fn call(&mut self, messages: Vec<Message>) -> Result<Vec<Message>> {
        let new_hashes = messages.iter().map(Message::get_hash).collect::<Vec<_>>();

        let start = self.first_unseen(&new_hashes);
        if start < self.last_hashes.len() {
            tracing::info!(agent = %self.name, step = self.step, kept = start, "history compacted");
        }

        for message in &messages[start..] {
            tracing::info!(agent = %self.name, step = self.step, "{}", message.to_string().trim_end());
        }

        self.step += 1;
        self.last_hashes = new_hashes;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::TranscriptTracer;
    use crate::Result;
    use crate::callbacks::Callback;
    use crate::llm::Message;

    fn user(s: &str) -> Message {
        Message::User(s.to_string())
    }

    #[tokio::test]
    async fn test_tracks_appended_and_rewritten_history() -> Result<()> {
        let mut tracer = TranscriptTracer::new("test");

        let history = tracer.call(vec![user("a"), user("b")]).await?;
        assert_eq!(history.len(), 2);

        let grown = vec![user("a"), user("b"), user("c")];
        let hashes = grown.iter().map(Message::get_hash).collect::<Vec<_>>();
        assert_eq!(tracer.first_unseen(&hashes), 2);
        tracer.call(grown).await?;

        // only the summary and what follows it are traced again
        let rewritten = vec![user("a"), user("b"), user("summary"), user("d")];
        let hashes = rewritten.iter().map(Message::get_hash).collect::<Vec<_>>();
        assert_eq!(tracer.first_unseen(&hashes), 2);

        let history = tracer.call(rewritten).await?;
        assert!(matches!(&history[2], Message::User(s) if s == "summary"));
        assert_eq!(tracer.step, 3);

        Ok(())
    }
}
