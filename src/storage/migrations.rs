use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

static MIGRATION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Применяет embedded-миграции.
///
/// Запуск сериализуется внутри процесса; между процессами конкуренцию
/// разрешает busy_timeout — сами миграции refinery применяет в собственных
/// транзакциях, внешний BEGIN здесь недопустим.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mutex = MIGRATION_LOCK.get_or_init(|| Mutex::new(()));
    // Миграции идемпотентны, poisoned-lock можно безопасно переиспользовать
    let _guard = match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Migration lock was poisoned, recovering...");
            poisoned.into_inner()
        }
    };

    apply(conn)
}

/// Миграции без процессного замка (для тестов на изолированных базах).
#[doc(hidden)]
pub fn run_migrations_for_test(conn: &mut Connection) -> Result<()> {
    apply(conn)
}

fn apply(conn: &mut Connection) -> Result<()> {
    conn.busy_timeout(Duration::from_secs(30))
        .context("set SQLite busy timeout")?;

    let report = embedded::migrations::runner().run(conn).context("apply migrations")?;
    for migration in report.applied_migrations() {
        log::info!("applied migration {}", migration);
    }
    Ok(())
}
