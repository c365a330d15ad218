//! Callback query routing: lifecycle menus first, then game actions

use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;

use super::types::HandlerDeps;
use crate::core::AppError;
use crate::game::{Action, Outcome};
use crate::storage::players::{self, PlayerClass};
use crate::storage::{db, progress};
use crate::telegram::keyboards::{self, lifecycle};
use crate::telegram::render;

const NO_CHARACTER_ALERT: &str = "Сначала создай персонажа: /start";
const GENERIC_ALERT: &str = "⚠️ Что-то пошло не так, попробуй еще раз";

pub async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> anyhow::Result<()> {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let telegram_id = i64::try_from(q.from.id.0).unwrap_or_default();
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(telegram_id));

    // Lifecycle buttons live outside the stage machine
    if let Some(class_name) = data.strip_prefix(lifecycle::CLASS_PREFIX) {
        return handle_class_selection(&bot, &q, &deps, chat_id, telegram_id, class_name).await;
    }
    match data.as_str() {
        lifecycle::TUTORIAL_START | lifecycle::RESTART_YES => {
            return handle_tutorial_start(&bot, &q, &deps, chat_id, telegram_id).await;
        }
        lifecycle::RESUME => {
            return handle_resume(&bot, &q, &deps, chat_id, telegram_id).await;
        }
        lifecycle::RESTART => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.send_message(chat_id, "🔄 Начать заново? Прогресс и инвентарь будут стерты.")
                .reply_markup(keyboards::restart_confirm())
                .await?;
            return Ok(());
        }
        lifecycle::RESTART_NO => {
            bot.answer_callback_query(q.id.clone()).text("Хорошо, продолжаем").await?;
            return Ok(());
        }
        _ => {}
    }

    // Everything else is a game action
    let Some(action) = Action::parse(&data) else {
        log::warn!("unparsed callback data from {telegram_id}: {data}");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let player = {
        let conn = db::get_connection(&deps.db_pool)?;
        players::active_player(&conn, telegram_id)?
    };
    let Some(player) = player else {
        bot.answer_callback_query(q.id.clone())
            .text(NO_CHARACTER_ALERT)
            .show_alert(true)
            .await?;
        return Ok(());
    };

    match deps.engine.handle(player.id, action).await {
        Ok(outcome) => deliver(&bot, &q, chat_id, outcome).await,
        Err(AppError::Game(err)) => {
            // Guard refusal: the player stays on the stage, only an alert pops
            bot.answer_callback_query(q.id.clone())
                .text(err.alert_text())
                .show_alert(true)
                .await?;
            Ok(())
        }
        Err(err) => {
            log::error!("callback failed for player {}: {err}", player.id);
            bot.answer_callback_query(q.id.clone())
                .text(GENERIC_ALERT)
                .show_alert(true)
                .await?;
            Ok(())
        }
    }
}

/// Sends or edits the stage screen produced by the engine.
async fn deliver(bot: &Bot, q: &CallbackQuery, chat_id: ChatId, outcome: Outcome) -> anyhow::Result<()> {
    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(notice) = &outcome.notice {
        answer = answer.text(notice.clone());
    }
    answer.await?;

    let regular = q.message.as_ref().and_then(|m| match m {
        MaybeInaccessibleMessage::Regular(msg) => Some(msg.as_ref()),
        MaybeInaccessibleMessage::Inaccessible(_) => None,
    });

    if outcome.edit {
        if let Some(msg) = regular {
            let has_photo = msg.photo().is_some();
            match render::edit_view(bot, chat_id, msg.id, has_photo, &outcome.view).await {
                Ok(()) => return Ok(()),
                Err(e) => log::warn!("edit failed, sending fresh screen: {e}"),
            }
        }
    }
    render::send_view(bot, chat_id, &outcome.view).await?;
    Ok(())
}

async fn handle_class_selection(
    bot: &Bot,
    q: &CallbackQuery,
    deps: &HandlerDeps,
    chat_id: ChatId,
    telegram_id: i64,
    class_name: &str,
) -> anyhow::Result<()> {
    let Ok(class) = class_name.parse::<PlayerClass>() else {
        log::warn!("unknown class in callback: {class_name}");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let conn = db::get_connection(&deps.db_pool)?;
    let user_id = players::ensure_user(&conn, telegram_id, q.from.username.as_deref())?;
    if players::active_player(&conn, telegram_id)?.is_some() {
        bot.answer_callback_query(q.id.clone())
            .text("Персонаж уже создан")
            .show_alert(true)
            .await?;
        return Ok(());
    }
    players::add_player(&conn, user_id, &q.from.first_name, class)?;
    drop(conn);

    bot.answer_callback_query(q.id.clone()).await?;
    bot.send_message(
        chat_id,
        format!(
            "Выбран класс «{class}».\n{}\n\nИстория начинается у дверей магазина кожевенных товаров.",
            class.description()
        ),
    )
    .reply_markup(keyboards::tutorial_start_menu())
    .await?;
    Ok(())
}

async fn handle_tutorial_start(
    bot: &Bot,
    q: &CallbackQuery,
    deps: &HandlerDeps,
    chat_id: ChatId,
    telegram_id: i64,
) -> anyhow::Result<()> {
    let player = {
        let conn = db::get_connection(&deps.db_pool)?;
        players::active_player(&conn, telegram_id)?
    };
    let Some(player) = player else {
        bot.answer_callback_query(q.id.clone())
            .text(NO_CHARACTER_ALERT)
            .show_alert(true)
            .await?;
        return Ok(());
    };

    let outcome = deps.engine.start_tutorial(player.id).await?;
    bot.answer_callback_query(q.id.clone()).await?;
    render::send_view(bot, chat_id, &outcome.view).await?;
    Ok(())
}

async fn handle_resume(
    bot: &Bot,
    q: &CallbackQuery,
    deps: &HandlerDeps,
    chat_id: ChatId,
    telegram_id: i64,
) -> anyhow::Result<()> {
    let player = {
        let conn = db::get_connection(&deps.db_pool)?;
        players::active_player(&conn, telegram_id)?
    };
    let Some(player) = player else {
        bot.answer_callback_query(q.id.clone())
            .text(NO_CHARACTER_ALERT)
            .show_alert(true)
            .await?;
        return Ok(());
    };

    let has_progress = {
        let conn = db::get_connection(&deps.db_pool)?;
        progress::get(&conn, player.id)?.is_some()
    };
    let outcome = if has_progress {
        deps.engine.resume(player.id).await?
    } else {
        deps.engine.start_tutorial(player.id).await?
    };
    bot.answer_callback_query(q.id.clone()).await?;
    render::send_view(bot, chat_id, &outcome.view).await?;
    Ok(())
}
