use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Game-rule rejections: the player stays on the current stage and the
    /// rejection is shown as a callback alert
    #[error("{0}")]
    Game(#[from] GameError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Ошибки игровых правил. Каждая отображается игроку как alert на
/// callback-запрос, состояние при этом не меняется.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Товар с таким SKU не найден в каталоге
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Товар не входит в список разрешенных для текущего магазина
    #[error("item locked in this shop: {0}")]
    ItemLocked(String),

    /// Товар уже есть в инвентаре
    #[error("duplicate purchase: {0}")]
    AlreadyOwned(String),

    /// Недостаточно монет
    #[error("insufficient funds: need {price}, have {balance}")]
    InsufficientFunds { price: i64, balance: i64 },

    /// Не выполнено условие выхода из магазина
    #[error("missing required items: {0:?}")]
    MissingItems(Vec<String>),

    /// Подтверждение мульти-выбора с неполным или лишним набором
    #[error("wrong selection (missing {missing:?}, extra {extra:?})")]
    WrongSelection { missing: Vec<String>, extra: Vec<String> },

    /// Выбран предмет, который не подходит для текущего шага
    #[error("item not needed now: {0}")]
    NotNeeded(String),

    /// Действие не предусмотрено текущим этапом
    #[error("action not valid for stage {0}")]
    WrongStage(String),

    /// У пользователя нет активного персонажа
    #[error("no active character")]
    NoCharacter,

    /// Прогресс обучения не инициализирован
    #[error("no tutorial progress for player {0}")]
    NoProgress(i64),
}

impl GameError {
    /// Текст alert-сообщения для игрока.
    pub fn alert_text(&self) -> String {
        match self {
            Self::UnknownItem(_) => "❌ Товар не найден".to_string(),
            Self::ItemLocked(_) => "❌ Этот товар недоступен в обучении!".to_string(),
            Self::AlreadyOwned(_) => "❌ У тебя уже есть этот предмет!".to_string(),
            Self::InsufficientFunds { .. } => "❌ Недостаточно монет!".to_string(),
            Self::MissingItems(missing) => {
                let list = missing
                    .iter()
                    .map(|name| format!("• {name}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("❌ Ты еще не все купил!\n\nНе хватает:\n{list}\n\nВернись и докупи необходимые товары.")
            }
            Self::WrongSelection { missing, extra } => {
                if !extra.is_empty() {
                    format!("❌ Это сейчас не понадобится: {}", extra.join(", "))
                } else {
                    format!("❌ Не выбраны: {}", missing.join(", "))
                }
            }
            Self::NotNeeded(_) => "❌ Сейчас мне это не нужно".to_string(),
            Self::WrongStage(_) => "❌ Это действие сейчас недоступно".to_string(),
            Self::NoCharacter => "❌ Ошибка: персонаж не найден".to_string(),
            Self::NoProgress(_) => "❌ Обучение еще не начато".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_items_alert_lists_every_name() {
        let err = GameError::MissingItems(vec!["Канцелярский нож".to_string(), "Пчелиный воск".to_string()]);
        let text = err.alert_text();
        assert!(text.contains("Не хватает"));
        assert!(text.contains("• Канцелярский нож"));
        assert!(text.contains("• Пчелиный воск"));
    }

    #[test]
    fn selection_alert_prefers_extra_over_missing() {
        let err = GameError::WrongSelection {
            missing: vec!["Мультитул 3 в 1".to_string()],
            extra: vec!["Высечные пробойники".to_string()],
        };
        assert!(err.alert_text().contains("не понадобится"));
    }
}
