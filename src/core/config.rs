use once_cell::sync::Lazy;
use std::env;

/// Configuration constants for the bot
///
/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Directory with stage illustrations
/// Read from IMAGES_DIR environment variable
/// Default: images
pub static IMAGES_DIR: Lazy<String> = Lazy::new(|| env::var("IMAGES_DIR").unwrap_or_else(|_| "images".to_string()));

/// Telegram IDs with access to admin commands (/setstage, /progress)
/// Read from ADMIN_IDS environment variable, comma-separated
pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
    env::var("ADMIN_IDS")
        .map(|raw| raw.split(',').filter_map(|part| part.trim().parse().ok()).collect())
        .unwrap_or_default()
});

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Timeout for Telegram API requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Retry configuration for busy SQLite handles
pub mod retry {
    use std::time::Duration;

    /// Maximum number of attempts for a locked database
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Linear backoff step between attempts (milliseconds)
    pub const BACKOFF_STEP_MS: u64 = 120;

    /// Backoff before the given attempt (1-based)
    pub fn backoff(attempt: u32) -> Duration {
        Duration::from_millis(BACKOFF_STEP_MS * u64::from(attempt))
    }
}

/// Economy tuning
pub mod economy {
    /// Стартовый баланс обучения. В старой версии таблица объявляла 1500,
    /// а все обработчики работали с 2000 — канонично 2000.
    pub const STARTING_BALANCE: i64 = 2000;

    /// Награда за подаренный картхолдер
    pub const HOLDER_GIFT_REWARD: i64 = 2000;

    /// Доплата премиального клиента после первой сумки
    pub const PREMIUM_CLIENT_REWARD: i64 = 1000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_backoff_is_linear() {
        assert_eq!(retry::backoff(1).as_millis(), 120);
        assert_eq!(retry::backoff(3).as_millis(), 360);
    }

    #[test]
    fn economy_constants_are_positive() {
        assert!(economy::STARTING_BALANCE > 0);
        assert!(economy::HOLDER_GIFT_REWARD > 0);
        assert!(economy::PREMIUM_CLIENT_REWARD > 0);
    }
}
