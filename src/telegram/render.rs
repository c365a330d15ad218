//! Sending and editing stage screens
//!
//! A stage screen is a photo with a caption and an inline keyboard. When the
//! illustration is missing on disk the screen degrades to plain text.

use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};

use super::{images, keyboards};
use crate::game::StageView;

/// Sends a stage view as a new message.
pub async fn send_view(bot: &Bot, chat_id: ChatId, view: &StageView) -> Result<(), teloxide::RequestError> {
    let markup = keyboards::stage_markup(view);
    match images::resolve(view.image) {
        Some(path) => {
            bot.send_photo(chat_id, InputFile::file(path))
                .caption(view.text.clone())
                .reply_markup(markup)
                .await?;
        }
        None => {
            bot.send_message(chat_id, view.text.clone()).reply_markup(markup).await?;
        }
    }
    Ok(())
}

/// Edits an existing stage message in place (category browsing, toggles).
///
/// Photo messages get their caption edited, text messages their text.
pub async fn edit_view(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    has_photo: bool,
    view: &StageView,
) -> Result<(), teloxide::RequestError> {
    let markup = keyboards::stage_markup(view);
    if has_photo {
        bot.edit_message_caption(chat_id, message_id)
            .caption(view.text.clone())
            .reply_markup(markup)
            .await?;
    } else {
        bot.edit_message_text(chat_id, message_id, view.text.clone())
            .reply_markup(markup)
            .await?;
    }
    Ok(())
}
