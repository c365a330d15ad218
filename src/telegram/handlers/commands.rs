//! Command handlers: /start, /help and hidden admin commands

use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use super::types::HandlerDeps;
use crate::core::config;
use crate::game::Stage;
use crate::storage::{db, inventory, players, progress};
use crate::telegram::bot::Command;
use crate::telegram::{keyboards, render};

const CLASS_PROMPT: &str = "👋 Добро пожаловать в «Ремесло»!\n\n\
    Ты начинаешь путь кожевника: первый ремень, первый заказ, своя мастерская.\n\n\
    Для начала выбери, кем ты был до ремесла:";

const TUTORIAL_PROMPT: &str = "Персонаж готов. История начинается у дверей магазина кожевенных товаров.\n\n\
    Нажми кнопку, когда будешь готов.";

/// /start: register the user and route to class selection, tutorial start
/// or the resume menu depending on saved state.
pub async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let username = msg.from.as_ref().and_then(|u| u.username.as_deref());

    let conn = db::get_connection(&deps.db_pool)?;
    players::ensure_user(&conn, chat_id.0, username)?;

    let Some(player) = players::active_player(&conn, chat_id.0)? else {
        bot.send_message(chat_id, CLASS_PROMPT)
            .reply_markup(keyboards::class_selection())
            .await?;
        return Ok(());
    };

    match progress::get(&conn, player.id)? {
        Some(record) if record.is_completed => {
            bot.send_message(
                chat_id,
                format!(
                    "🏆 {}, обучение пройдено — «Мастерская для Души» работает!\n\nМожно пройти историю заново.",
                    player.name
                ),
            )
            .reply_markup(keyboards::resume_menu())
            .await?;
        }
        Some(_) => {
            bot.send_message(chat_id, format!("С возвращением, {}! Продолжим с того же места?", player.name))
                .reply_markup(keyboards::resume_menu())
                .await?;
        }
        None => {
            bot.send_message(chat_id, TUTORIAL_PROMPT)
                .reply_markup(keyboards::tutorial_start_menu())
                .await?;
        }
    }
    Ok(())
}

pub async fn handle_help_command(bot: &Bot, msg: &Message) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
    Ok(())
}

fn is_admin(msg: &Message) -> bool {
    msg.from
        .as_ref()
        .and_then(|u| i64::try_from(u.id.0).ok())
        .is_some_and(|id| config::ADMIN_IDS.contains(&id))
}

/// Resolves the target player: explicit id argument or the admin's own
/// active character.
fn target_player(conn: &rusqlite::Connection, msg: &Message, arg: Option<&str>) -> anyhow::Result<Option<i64>> {
    match arg {
        Some(raw) => {
            let id: i64 = raw.parse()?;
            Ok(players::player_by_id(conn, id)?.map(|p| p.id))
        }
        None => Ok(players::active_player(conn, msg.chat.id.0)?.map(|p| p.id)),
    }
}

/// /setstage <stage> [player_id] — admin-only stage override.
pub async fn handle_setstage_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> anyhow::Result<()> {
    if !is_admin(msg) {
        bot.send_message(msg.chat.id, "⛔ Команда доступна только администратору").await?;
        return Ok(());
    }

    let text = msg.text().unwrap_or_default();
    let mut args = text.split_whitespace().skip(1);
    let Some(stage_name) = args.next() else {
        bot.send_message(msg.chat.id, "Использование: /setstage <этап> [id игрока]").await?;
        return Ok(());
    };
    let Ok(stage) = stage_name.parse::<Stage>() else {
        bot.send_message(msg.chat.id, format!("Неизвестный этап: {stage_name}")).await?;
        return Ok(());
    };

    let conn = db::get_connection(&deps.db_pool)?;
    let Some(player_id) = target_player(&conn, msg, args.next())? else {
        bot.send_message(msg.chat.id, "Игрок не найден").await?;
        return Ok(());
    };
    drop(conn);

    log::info!("admin {}: /setstage {} for player {player_id}", msg.chat.id, stage.as_str());
    let outcome = deps.engine.force_stage(player_id, stage).await?;
    render::send_view(bot, msg.chat.id, &outcome.view).await?;
    Ok(())
}

/// /progress [player_id] — admin-only progress dump.
pub async fn handle_progress_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> anyhow::Result<()> {
    if !is_admin(msg) {
        bot.send_message(msg.chat.id, "⛔ Команда доступна только администратору").await?;
        return Ok(());
    }

    let text = msg.text().unwrap_or_default();
    let arg = text.split_whitespace().nth(1);

    let conn = db::get_connection(&deps.db_pool)?;
    let Some(player_id) = target_player(&conn, msg, arg)? else {
        bot.send_message(msg.chat.id, "Игрок не найден").await?;
        return Ok(());
    };

    let Some(record) = progress::get(&conn, player_id)? else {
        bot.send_message(msg.chat.id, format!("У игрока {player_id} нет прогресса")).await?;
        return Ok(());
    };
    let items = inventory::names(&conn, player_id)?;

    let mut report = format!(
        "📊 Игрок {player_id}\nЭтап: {}\nБаланс: {} монет\nЗавершено: {}\n",
        record.current_stage,
        record.balance,
        if record.is_completed { "да" } else { "нет" }
    );
    if items.is_empty() {
        report.push_str("Инвентарь пуст");
    } else {
        report.push_str("Инвентарь:\n");
        for name in items {
            report.push_str(&format!("• {name}\n"));
        }
    }
    bot.send_message(msg.chat.id, report).await?;
    Ok(())
}
