//! Пользователи и персонажи. Класс задает стартовые характеристики.

use rusqlite::{Connection, OptionalExtension, Row};
use strum::{Display, EnumIter, EnumString};

use crate::core::AppResult;

/// Класс персонажа со стартовым распределением характеристик.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum PlayerClass {
    #[strum(serialize = "Работяга")]
    Workhorse,
    #[strum(serialize = "Менеджер")]
    Manager,
    #[strum(serialize = "Блоггер")]
    Blogger,
}

impl PlayerClass {
    /// (мастерство, удача, маркетинг, репутация)
    pub fn stats(self) -> (i64, i64, i64, i64) {
        match self {
            Self::Workhorse => (25, 15, 5, 5),
            Self::Manager => (10, 15, 25, 10),
            Self::Blogger => (5, 25, 20, 20),
        }
    }

    /// Стартовые монеты персонажа (вне обучения).
    pub fn starting_coins(self) -> i64 {
        1500
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Workhorse => "💪 Руки растут откуда надо: мастерство выше всех",
            Self::Manager => "📈 Умеет продавать: маркетинг выше всех",
            Self::Blogger => "📱 Публика уже есть: удача и репутация выше всех",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub class: PlayerClass,
    pub coins: i64,
    pub is_active: bool,
}

impl Player {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let class: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            class: class.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
            coins: row.get(4)?,
            is_active: row.get::<_, i64>(5)? != 0,
        })
    }
}

const SELECT_PLAYER: &str = "SELECT id, user_id, name, class, coins, is_active FROM players";

/// Регистрирует пользователя Telegram, если его еще нет.
pub fn ensure_user(conn: &Connection, telegram_id: i64, username: Option<&str>) -> AppResult<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO users (telegram_id, username) VALUES (?1, ?2)",
        rusqlite::params![telegram_id, username],
    )?;
    let id = conn.query_row("SELECT id FROM users WHERE telegram_id = ?1", [telegram_id], |row| {
        row.get(0)
    })?;
    Ok(id)
}

/// Создает персонажа и делает его активным; прежний активный деактивируется.
pub fn add_player(conn: &Connection, user_id: i64, name: &str, class: PlayerClass) -> AppResult<i64> {
    conn.execute("UPDATE players SET is_active = 0 WHERE user_id = ?1", [user_id])?;
    let (mastery, luck, marketing, reputation) = class.stats();
    conn.execute(
        "INSERT INTO players (user_id, name, class, mastery, luck, marketing, reputation, coins, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
        rusqlite::params![
            user_id,
            name,
            class.to_string(),
            mastery,
            luck,
            marketing,
            reputation,
            class.starting_coins()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Активный персонаж пользователя Telegram.
pub fn active_player(conn: &Connection, telegram_id: i64) -> AppResult<Option<Player>> {
    let player = conn
        .query_row(
            &format!(
                "{SELECT_PLAYER} WHERE is_active = 1 AND user_id =
                 (SELECT id FROM users WHERE telegram_id = ?1)"
            ),
            [telegram_id],
            Player::from_row,
        )
        .optional()?;
    Ok(player)
}

pub fn player_by_id(conn: &Connection, player_id: i64) -> AppResult<Option<Player>> {
    let player = conn
        .query_row(&format!("{SELECT_PLAYER} WHERE id = ?1"), [player_id], Player::from_row)
        .optional()?;
    Ok(player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::storage::migrations::run_migrations_for_test(&mut conn).unwrap();
        conn
    }

    #[test]
    fn ensure_user_is_idempotent() {
        let conn = test_conn();
        let first = ensure_user(&conn, 1000, Some("crafter")).unwrap();
        let second = ensure_user(&conn, 1000, Some("crafter")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn new_player_deactivates_previous() {
        let conn = test_conn();
        let user = ensure_user(&conn, 1000, None).unwrap();
        let first = add_player(&conn, user, "Гена", PlayerClass::Workhorse).unwrap();
        let second = add_player(&conn, user, "Стас", PlayerClass::Blogger).unwrap();

        let active = active_player(&conn, 1000).unwrap().unwrap();
        assert_eq!(active.id, second);
        assert!(!player_by_id(&conn, first).unwrap().unwrap().is_active);
    }

    #[test]
    fn class_stats_match_design() {
        assert_eq!(PlayerClass::Workhorse.stats(), (25, 15, 5, 5));
        assert_eq!(PlayerClass::Manager.stats(), (10, 15, 25, 10));
        assert_eq!(PlayerClass::Blogger.stats(), (5, 25, 20, 20));
    }
}
