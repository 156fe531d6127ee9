use smorti_core::config::LoadOptions;
use smorti_core::{ConversationId, TurnError};

use super::{runtime, Assistant, CommandResult, EXIT_INPUT, EXIT_RUNTIME};

const COMMAND: &str = "ask";

/// Answers one message in a fresh conversation.
pub fn run(
    options: LoadOptions,
    conversation: Option<ConversationId>,
    text: &str,
    json: bool,
) -> CommandResult {
    let assistant = match Assistant::prepare(COMMAND, options) {
        Ok(assistant) => assistant,
        Err(result) => return result,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let conversation = conversation.unwrap_or_else(ConversationId::generate);
    let mut state = assistant.engine.new_conversation(conversation);
    let response = match runtime.block_on(assistant.engine.handle_turn(&mut state, text)) {
        Ok(response) => response,
        Err(TurnError::EmptyUtterance) => {
            return CommandResult::failure(COMMAND, "empty_utterance", "message is empty", EXIT_INPUT);
        }
        Err(error) => {
            return CommandResult::failure(COMMAND, "turn", error.to_string(), EXIT_RUNTIME);
        }
    };

    match assistant.format(&response, json) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(COMMAND, "render", error.to_string(), EXIT_RUNTIME),
    }
}
