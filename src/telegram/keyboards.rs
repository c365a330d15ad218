//! Inline keyboards: stage views and lifecycle menus

use strum::IntoEnumIterator;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::game::StageView;
use crate::storage::players::PlayerClass;

/// Lifecycle callback data, routed before game actions.
pub mod lifecycle {
    pub const CLASS_PREFIX: &str = "class:";
    pub const TUTORIAL_START: &str = "tut:start";
    pub const RESUME: &str = "resume";
    pub const RESTART: &str = "restart";
    pub const RESTART_YES: &str = "restart:yes";
    pub const RESTART_NO: &str = "restart:no";
}

/// Builds the inline keyboard for a stage view.
pub fn stage_markup(view: &StageView) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = view
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.encode()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Character class selection, one class per row.
pub fn class_selection() -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = PlayerClass::iter()
        .map(|class| {
            vec![InlineKeyboardButton::callback(
                class.to_string(),
                format!("{}{}", lifecycle::CLASS_PREFIX, class),
            )]
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Menu for a player with saved progress.
pub fn resume_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("▶️ Продолжить", lifecycle::RESUME)],
        vec![InlineKeyboardButton::callback("🔄 Начать заново", lifecycle::RESTART)],
    ])
}

/// Menu for a fresh character without progress.
pub fn tutorial_start_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🎮 Начать обучение",
        lifecycle::TUTORIAL_START,
    )]])
}

/// Restart confirmation: progress and inventory will be wiped.
pub fn restart_confirm() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Да, заново", lifecycle::RESTART_YES),
        InlineKeyboardButton::callback("❌ Нет", lifecycle::RESTART_NO),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Action, Stage, StageView};

    #[test]
    fn stage_markup_preserves_row_structure() {
        let view = StageView::new(Stage::WaitingForShopEnter, "text", "x.jpg")
            .with_button("Дальше", Action::Continue)
            .with_row(vec![]);
        let markup = stage_markup(&view);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 1);
    }

    #[test]
    fn class_selection_offers_all_classes() {
        let markup = class_selection();
        assert_eq!(markup.inline_keyboard.len(), 3);
    }
}
