//! Прогресс обучения: текущий этап, баланс, журнал пройденных этапов.

use rusqlite::{Connection, OptionalExtension};

use crate::core::config::economy;
use crate::core::{AppResult, GameError};
use crate::game::stage::Stage;

/// Строка прогресса игрока.
#[derive(Debug, Clone)]
pub struct Progress {
    pub player_id: i64,
    /// Сырое имя этапа из базы; неизвестные значения разрешаются в
    /// начальный этап на уровне движка (fail closed)
    pub current_stage: String,
    pub balance: i64,
    pub completed_stages: Vec<String>,
    pub is_completed: bool,
}

impl Progress {
    /// Текущий этап как закрытый enum. Неизвестная строка — `None`.
    pub fn stage(&self) -> Option<Stage> {
        self.current_stage.parse().ok()
    }
}

/// Инициализирует прогресс заново: старый прогресс и инвентарь стираются,
/// баланс сбрасывается на стартовый.
pub fn init(conn: &Connection, player_id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM tutorial_progress WHERE player_id = ?1", [player_id])?;
    super::inventory::clear(conn, player_id)?;
    conn.execute(
        "INSERT INTO tutorial_progress (player_id, current_stage, balance) VALUES (?1, ?2, ?3)",
        rusqlite::params![player_id, Stage::entry().as_str(), economy::STARTING_BALANCE],
    )?;
    log::info!("player {player_id}: tutorial progress initialized");
    Ok(())
}

pub fn get(conn: &Connection, player_id: i64) -> AppResult<Option<Progress>> {
    let row = conn
        .query_row(
            "SELECT player_id, current_stage, balance, completed_stages, is_completed
             FROM tutorial_progress WHERE player_id = ?1",
            [player_id],
            |row| {
                let completed: String = row.get(3)?;
                Ok(Progress {
                    player_id: row.get(0)?,
                    current_stage: row.get(1)?,
                    balance: row.get(2)?,
                    completed_stages: completed.split(',').filter(|s| !s.is_empty()).map(String::from).collect(),
                    is_completed: row.get::<_, i64>(4)? != 0,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Прогресс или ошибка, если обучение не начато.
pub fn require(conn: &Connection, player_id: i64) -> AppResult<Progress> {
    get(conn, player_id)?.ok_or_else(|| GameError::NoProgress(player_id).into())
}

/// Переводит игрока на новый этап; прежний этап дописывается в журнал.
pub fn set_stage(conn: &Connection, player_id: i64, stage: Stage) -> AppResult<()> {
    let updated = conn.execute(
        "UPDATE tutorial_progress
         SET completed_stages = CASE
                 WHEN completed_stages = '' THEN current_stage
                 ELSE completed_stages || ',' || current_stage
             END,
             current_stage = ?2,
             updated_at = CURRENT_TIMESTAMP
         WHERE player_id = ?1",
        rusqlite::params![player_id, stage.as_str()],
    )?;
    if updated == 0 {
        return Err(GameError::NoProgress(player_id).into());
    }
    Ok(())
}

pub fn set_balance(conn: &Connection, player_id: i64, balance: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE tutorial_progress SET balance = ?2, updated_at = CURRENT_TIMESTAMP WHERE player_id = ?1",
        rusqlite::params![player_id, balance],
    )?;
    Ok(())
}

/// Завершает обучение: терминальный этап + флаг.
pub fn complete(conn: &Connection, player_id: i64) -> AppResult<()> {
    set_stage(conn, player_id, Stage::Completed)?;
    conn.execute(
        "UPDATE tutorial_progress SET is_completed = 1, updated_at = CURRENT_TIMESTAMP WHERE player_id = ?1",
        [player_id],
    )?;
    Ok(())
}

/// Стирает прогресс и инвентарь (подтвержденная новая игра).
pub fn clear(conn: &Connection, player_id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM tutorial_progress WHERE player_id = ?1", [player_id])?;
    super::inventory::clear(conn, player_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::storage::migrations::run_migrations_for_test(&mut conn).unwrap();
        // FK: строки прогресса ссылаются на players(id)
        conn.execute_batch(
            "INSERT INTO users (id, telegram_id) VALUES (1, 1000);
             INSERT INTO players (id, user_id, name, class) VALUES (7, 1, 'Тестер', 'Работяга');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn init_resets_balance_and_stage() {
        let conn = test_conn();
        init(&conn, 7).unwrap();
        set_balance(&conn, 7, 10).unwrap();
        set_stage(&conn, 7, Stage::InShopMenu).unwrap();

        init(&conn, 7).unwrap();
        let progress = require(&conn, 7).unwrap();
        assert_eq!(progress.balance, economy::STARTING_BALANCE);
        assert_eq!(progress.stage(), Some(Stage::entry()));
        assert!(progress.completed_stages.is_empty());
    }

    #[test]
    fn set_stage_appends_to_log() {
        let conn = test_conn();
        init(&conn, 7).unwrap();
        set_stage(&conn, 7, Stage::WaitingForApproach).unwrap();
        set_stage(&conn, 7, Stage::WaitingForOldmanApproach).unwrap();

        let progress = require(&conn, 7).unwrap();
        assert_eq!(
            progress.completed_stages,
            vec!["waiting_for_shop_enter".to_string(), "waiting_for_approach".to_string()]
        );
        assert_eq!(progress.current_stage, "waiting_for_oldman_approach");
    }

    #[test]
    fn set_stage_without_progress_is_an_error() {
        let conn = test_conn();
        assert!(set_stage(&conn, 99, Stage::InShopMenu).is_err());
    }

    #[test]
    fn complete_sets_flag_and_terminal_stage() {
        let conn = test_conn();
        init(&conn, 7).unwrap();
        complete(&conn, 7).unwrap();
        let progress = require(&conn, 7).unwrap();
        assert!(progress.is_completed);
        assert_eq!(progress.stage(), Some(Stage::Completed));
    }

    #[test]
    fn unknown_stage_string_parses_to_none() {
        let conn = test_conn();
        init(&conn, 7).unwrap();
        conn.execute(
            "UPDATE tutorial_progress SET current_stage = 'waiting_for_dragon' WHERE player_id = 7",
            [],
        )
        .unwrap();
        let progress = require(&conn, 7).unwrap();
        assert_eq!(progress.stage(), None);
    }
}
