use crate::Result;
use crate::tools::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use std::hash::{DefaultHasher, Hash, Hasher};

mod openai;
pub use async_openai::config::OpenAIConfig;
pub use openai::OpenAI;

/// Rough characters-per-token ratio used for history budgeting.
const CHARS_PER_TOKEN: usize = 4;

#[derive(Clone, Debug, Hash)]
pub enum Message {
    User(String),
    Assistant(String, Vec<ToolCall>),
    System(String),
    Tool {
        id: String,
        name: String,
        result: String,
    },
}

impl Message {
    /// Estimated number of tokens this message occupies in a prompt.
    pub fn ntokens(&self) -> usize {
        let chars = match self {
            Message::User(content) | Message::System(content) => content.chars().count(),
            Message::Assistant(content, tool_calls) => {
                content.chars().count()
                    + tool_calls
                        .iter()
                        .map(|call| call.name.chars().count() + call.args.chars().count())
                        .sum::<usize>()
            }
            Message::Tool { result, .. } => result.chars().count(),
        };
        chars.div_ceil(CHARS_PER_TOKEN)
    }

    pub fn get_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::User(content) => write!(f, "**user**: {}\n\n", content),
            Message::System(content) => write!(f, "**system**: {}\n\n", content),
            Message::Assistant(content, tool_calls) => {
                write!(f, "**assistant**: {}\n\n", content)?;
                tool_calls.iter().try_for_each(|call| writeln!(f, "{}", call))
            }
            Message::Tool { id, name, result } => {
                write!(f, "**tool** {} ({}): {}\n\n", name, id, result)
            }
        }
    }
}

pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

pub struct CompletionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait LLM {
    async fn completion<'a>(&self, request: CompletionRequest<'a>) -> Result<CompletionResponse>;
}
