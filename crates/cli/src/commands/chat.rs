use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use smorti_core::config::LoadOptions;
use smorti_core::{ConversationId, TurnError};

use super::{runtime, Assistant, CommandResult, EXIT_RUNTIME};

const COMMAND: &str = "chat";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatSummary {
    pub conversations: usize,
    pub turns: usize,
}

pub fn run(options: LoadOptions, json: bool) -> CommandResult {
    let assistant = match Assistant::prepare(COMMAND, options) {
        Ok(assistant) => assistant,
        Err(result) => return result,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let outcome = runtime.block_on(async {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        session(&assistant, stdin, &mut stdout, json).await
    });

    match outcome {
        Ok(summary) => CommandResult::success(
            COMMAND,
            format!(
                "chat ended after {} turn(s) across {} conversation(s)",
                summary.turns, summary.conversations
            ),
        ),
        Err(error) => CommandResult::failure(COMMAND, "io", error.to_string(), EXIT_RUNTIME),
    }
}

/// Reads one shopper message per line until EOF or `/quit`. `/reset`
/// drops the conversation state and starts a new conversation.
pub async fn session<R, W>(
    assistant: &Assistant,
    reader: R,
    writer: &mut W,
    json: bool,
) -> Result<ChatSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut state = assistant.engine.new_conversation(ConversationId::generate());
    let mut summary = ChatSummary { conversations: 1, turns: 0 };

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                info!(
                    event_name = "chat.conversation.reset",
                    conversation_id = %state.id(),
                    turns = state.turn_count(),
                    "conversation reset"
                );
                state = assistant.engine.new_conversation(ConversationId::generate());
                summary.conversations += 1;
                continue;
            }
            _ => {}
        }

        let output = match assistant.engine.handle_turn(&mut state, line).await {
            Ok(response) => {
                summary.turns += 1;
                assistant.format(&response, json)?
            }
            Err(TurnError::EmptyUtterance) => continue,
            Err(error) => return Err(error.into()),
        };

        let separator: &[u8] = if json { b"\n" } else { b"\n\n" };
        writer.write_all(output.as_bytes()).await?;
        writer.write_all(separator).await?;
        writer.flush().await?;
    }

    Ok(summary)
}
