//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::callbacks::handle_callback;
use super::commands::{
    handle_help_command, handle_progress_command, handle_setstage_command, handle_start_command,
};
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same schema is used in production and in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(callback_handler(deps_callback))
}

/// Handler for bot commands (/start, /help, admin commands)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                let result = match cmd {
                    Command::Start => handle_start_command(&bot, &msg, &deps).await,
                    Command::Help => handle_help_command(&bot, &msg).await,
                    Command::Setstage => handle_setstage_command(&bot, &msg, &deps).await,
                    Command::Progress => handle_progress_command(&bot, &msg, &deps).await,
                };
                if let Err(e) = result {
                    log::error!("Command {:?} failed for chat {}: {e:?}", cmd, msg.chat.id);
                    let _ = bot
                        .send_message(msg.chat.id, "⚠️ Что-то пошло не так, попробуй еще раз")
                        .await;
                }
                Ok(())
            }
        },
    ))
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let query_id = q.id.clone();
            if let Err(e) = handle_callback(bot.clone(), q, deps).await {
                log::error!("Callback handler failed: {e:?}");
                let _ = bot.answer_callback_query(query_id).await;
            }
            Ok(())
        }
    })
}
