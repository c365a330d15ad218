//! Инвентарь игрока: SKU-ключ, количество всегда 1 для учебных предметов.

use rusqlite::{Connection, OptionalExtension};

use super::catalog::ShopItem;
use crate::core::AppResult;

/// Предмет в инвентаре.
#[derive(Debug, Clone)]
pub struct InventoryItem {
    pub item_sku: String,
    pub item_name: String,
    pub item_type: String,
    pub quantity: i64,
    pub durability: i64,
}

/// Добавляет предмет. Возвращает `false`, если такой SKU уже есть —
/// дубликат определяется нарушением UNIQUE, а не предварительной проверкой.
pub fn add(conn: &Connection, player_id: i64, item: &ShopItem) -> AppResult<bool> {
    let result = conn.execute(
        "INSERT INTO player_inventory (player_id, item_sku, item_name, item_type, quantity, durability)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        rusqlite::params![player_id, item.sku, item.name, item.category.to_string(), item.durability],
    );
    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == rusqlite::ErrorCode::ConstraintViolation => {
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

pub fn has_sku(conn: &Connection, player_id: i64, sku: &str) -> AppResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM player_inventory WHERE player_id = ?1 AND item_sku = ?2",
        rusqlite::params![player_id, sku],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn has_name(conn: &Connection, player_id: i64, name: &str) -> AppResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM player_inventory WHERE player_id = ?1 AND item_name = ?2",
        rusqlite::params![player_id, name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Названия всех предметов игрока (для проверок выходных ворот).
pub fn names(conn: &Connection, player_id: i64) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT item_name FROM player_inventory WHERE player_id = ?1")?;
    let rows = stmt.query_map([player_id], |row| row.get(0))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Полный инвентарь, отсортированный по типу и названию.
pub fn list(conn: &Connection, player_id: i64) -> AppResult<Vec<InventoryItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_sku, item_name, item_type, quantity, durability FROM player_inventory
         WHERE player_id = ?1 ORDER BY item_type, item_name",
    )?;
    let rows = stmt.query_map([player_id], |row| {
        Ok(InventoryItem {
            item_sku: row.get(0)?,
            item_name: row.get(1)?,
            item_type: row.get(2)?,
            quantity: row.get(3)?,
            durability: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Списывает материал по названию (расход после крафта).
pub fn remove_by_name(conn: &Connection, player_id: i64, name: &str) -> AppResult<bool> {
    let removed = conn.execute(
        "DELETE FROM player_inventory WHERE player_id = ?1 AND item_name = ?2",
        rusqlite::params![player_id, name],
    )?;
    Ok(removed > 0)
}

/// Износ инструмента: прочность уменьшается, на нуле предмет ломается и
/// удаляется из инвентаря.
pub fn wear(conn: &Connection, player_id: i64, name: &str, amount: i64) -> AppResult<()> {
    let current: Option<i64> = conn
        .query_row(
            "SELECT durability FROM player_inventory WHERE player_id = ?1 AND item_name = ?2",
            rusqlite::params![player_id, name],
            |row| row.get(0),
        )
        .optional()?;

    match current {
        None => Ok(()),
        Some(durability) if durability - amount <= 0 => {
            conn.execute(
                "DELETE FROM player_inventory WHERE player_id = ?1 AND item_name = ?2",
                rusqlite::params![player_id, name],
            )?;
            log::info!("player {player_id}: tool worn out: {name}");
            Ok(())
        }
        Some(durability) => {
            conn.execute(
                "UPDATE player_inventory SET durability = ?3 WHERE player_id = ?1 AND item_name = ?2",
                rusqlite::params![player_id, name, durability - amount],
            )?;
            Ok(())
        }
    }
}

/// Полная очистка инвентаря (новая игра).
pub fn clear(conn: &Connection, player_id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM player_inventory WHERE player_id = ?1", [player_id])?;
    Ok(())
}
