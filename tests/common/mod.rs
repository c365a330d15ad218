//! Shared fixtures for integration tests

use remeslo::storage::players::PlayerClass;
use remeslo::storage::{catalog, create_pool, db::DbPool, get_connection, players, progress};

/// Temporary seeded database. The directory lives as long as the fixture.
pub struct TestDb {
    pub pool: DbPool,
    _dir: tempfile::TempDir,
}

pub fn test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.sqlite");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    let conn = get_connection(&pool).unwrap();
    catalog::seed(&conn).unwrap();
    TestDb { pool, _dir: dir }
}

/// Registers a user, creates a character and starts the tutorial.
pub fn new_player(pool: &DbPool, telegram_id: i64) -> i64 {
    let conn = get_connection(pool).unwrap();
    let user_id = players::ensure_user(&conn, telegram_id, Some("tester")).unwrap();
    let player_id = players::add_player(&conn, user_id, "Тестер", PlayerClass::Workhorse).unwrap();
    progress::init(&conn, player_id).unwrap();
    player_id
}

pub fn sku_of(pool: &DbPool, name: &str) -> String {
    let conn = get_connection(pool).unwrap();
    catalog::item_by_name(&conn, name)
        .unwrap()
        .unwrap_or_else(|| panic!("{name} not in catalog"))
        .sku
}

pub fn balance_of(pool: &DbPool, player_id: i64) -> i64 {
    let conn = get_connection(pool).unwrap();
    progress::get(&conn, player_id).unwrap().unwrap().balance
}

pub fn stage_name_of(pool: &DbPool, player_id: i64) -> String {
    let conn = get_connection(pool).unwrap();
    progress::get(&conn, player_id).unwrap().unwrap().current_stage
}
