//! Действия игрока и их кодирование в callback-данные.
//!
//! В полезной нагрузке всегда ездит SKU, а не отображаемое имя: имена
//! содержат пробелы и скобки и не влезают в лимит callback-данных.

use crate::storage::catalog::Category;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Единственная «дальше»-кнопка повествовательного экрана
    Continue,
    /// Открыть категорию магазина
    OpenCategory(Category),
    /// Вернуться к витрине магазина
    BackToShop,
    /// Купить товар
    Buy(String),
    /// Выйти из магазина (проверка обязательных покупок)
    LeaveShop,
    /// Одиночный выбор материала / нитки / воска
    Pick(String),
    /// Переключить предмет в мульти-выборе
    Toggle(String),
    /// Подтвердить мульти-выбор
    ConfirmSelection,
    /// Кнопка-заглушка: товар заблокирован в этом магазине
    Locked,
    /// Кнопка-заглушка: не хватает монет
    TooExpensive,
}

impl Action {
    /// Кодирует действие в callback-данные.
    pub fn encode(&self) -> String {
        match self {
            Self::Continue => "go".to_string(),
            Self::OpenCategory(category) => format!("cat:{}", category.code()),
            Self::BackToShop => "back".to_string(),
            Self::Buy(sku) => format!("buy:{sku}"),
            Self::LeaveShop => "leave".to_string(),
            Self::Pick(sku) => format!("pick:{sku}"),
            Self::Toggle(sku) => format!("tog:{sku}"),
            Self::ConfirmSelection => "confirm".to_string(),
            Self::Locked => "locked".to_string(),
            Self::TooExpensive => "poor".to_string(),
        }
    }

    /// Разбирает callback-данные. `None` — чужие или устаревшие данные.
    pub fn parse(data: &str) -> Option<Self> {
        if let Some((prefix, payload)) = data.split_once(':') {
            return match prefix {
                "cat" => Category::from_code(payload).map(Self::OpenCategory),
                "buy" => Some(Self::Buy(payload.to_string())),
                "pick" => Some(Self::Pick(payload.to_string())),
                "tog" => Some(Self::Toggle(payload.to_string())),
                _ => None,
            };
        }
        match data {
            "go" => Some(Self::Continue),
            "back" => Some(Self::BackToShop),
            "leave" => Some(Self::LeaveShop),
            "confirm" => Some(Self::ConfirmSelection),
            "locked" => Some(Self::Locked),
            "poor" => Some(Self::TooExpensive),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn actions_round_trip() {
        let actions = [
            Action::Continue,
            Action::OpenCategory(Category::Punches),
            Action::BackToShop,
            Action::Buy("MAT_КОЖДЛЯ_1".to_string()),
            Action::LeaveShop,
            Action::Pick("CHEM_ПЧЕВОС".to_string()),
            Action::Toggle("KNIFE_КАННОЖ".to_string()),
            Action::ConfirmSelection,
            Action::Locked,
            Action::TooExpensive,
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.encode()), Some(action));
        }
    }

    #[test]
    fn callback_data_fits_telegram_limit() {
        // Telegram обрезает callback-данные на 64 байтах
        let action = Action::Buy("THREAD_ШВЕМОС_12".to_string());
        assert!(action.encode().len() <= 64);
    }

    #[test]
    fn foreign_data_is_rejected() {
        assert_eq!(Action::parse("mode:mp3"), None);
        assert_eq!(Action::parse(""), None);
        assert_eq!(Action::parse("cat:UNKNOWN"), None);
    }
}
