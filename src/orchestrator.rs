//! Two-round tool calling loop: ask, run requested tools, ask once more.

use crate::error::Error;
use crate::providers::ChatProvider;
use crate::tools::ToolRegistry;
use crate::types::{CompletionResult, Conversation, Tool, Usage};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Location used by the demo runs (New Delhi).
pub const DEFAULT_LOCATION: &str = "28.6139,77.2090";

/// System framing for a run at `location`.
pub fn system_prompt(location: &str) -> String {
    format!(
        "You are a helpful assistant that can search for places. \
         User's current location is {location}."
    )
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final assistant content. `None` when the last reply carried no text.
    pub answer: Option<String>,
    /// Full history, including assistant tool requests and tool results.
    pub conversation: Conversation,
    /// Chat rounds performed (1 or 2).
    pub rounds: usize,
    /// Tool calls executed between the rounds.
    pub tool_calls: usize,
    pub usage: Usage,
}

/// Drives one user request through the chat provider and the tool registry.
#[derive(Clone)]
pub struct Orchestrator {
    chat: Arc<dyn ChatProvider>,
    tools: ToolRegistry,
}

impl Orchestrator {
    pub fn new(chat: Arc<dyn ChatProvider>, tools: ToolRegistry) -> Self {
        Self { chat, tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run a request to completion.
    pub async fn run(&self, user_message: &str, location: &str) -> Result<RunOutcome, Error> {
        self.run_with_cancel(user_message, location, &CancellationToken::new())
            .await
    }

    /// Run a request, aborting with [`Error::Cancelled`] once `cancel` fires.
    #[tracing::instrument(skip_all, fields(location = %location, provider = %self.chat.name()))]
    pub async fn run_with_cancel(
        &self,
        user_message: &str,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, Error> {
        let mut conversation = Conversation::seeded(system_prompt(location), user_message);
        let tools = self.tools.definitions();
        let mut usage = Usage::default();

        info!("first chat round");
        let first = self.round(&conversation, &tools, cancel).await?;
        usage.add(&first.usage);

        if !first.has_tool_calls() {
            debug!("answered without tools");
            conversation.push_assistant(first.to_message())?;
            return Ok(RunOutcome {
                answer: first.content,
                conversation,
                rounds: 1,
                tool_calls: 0,
                usage,
            });
        }

        info!(
            count = first.tool_calls.len(),
            first = %first.tool_calls[0].function.name,
            "model requested tools"
        );
        conversation.push_assistant(first.to_message())?;

        for call in &first.tool_calls {
            let output = guard(cancel, self.tools.dispatch(call)).await?;
            let content = output.unwrap_or_default();
            conversation.push_tool_result(&call.id, content)?;
        }

        info!("second chat round with tool results");
        let second = self.round(&conversation, &tools, cancel).await?;
        usage.add(&second.usage);

        if second.has_tool_calls() {
            warn!(
                count = second.tool_calls.len(),
                "ignoring tool calls requested in the final round"
            );
        }
        let answer = second.content.clone();
        conversation.push_assistant(second.to_message())?;

        Ok(RunOutcome {
            answer,
            conversation,
            rounds: 2,
            tool_calls: first.tool_calls.len(),
            usage,
        })
    }

    async fn round(
        &self,
        conversation: &Conversation,
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> Result<CompletionResult, Error> {
        guard(cancel, self.chat.complete(conversation.messages(), tools)).await
    }
}

/// Await `fut` unless `cancel` fires first.
async fn guard<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        res = fut => res,
    }
}
