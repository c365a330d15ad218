//! Экран этапа: текст, иллюстрация и клавиатура.

use super::action::Action;
use super::stage::Stage;

/// Кнопка экрана.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Полное описание экрана, который надо показать игроку.
#[derive(Debug, Clone)]
pub struct StageView {
    pub stage: Stage,
    pub text: String,
    /// Относительный путь иллюстрации внутри каталога изображений
    pub image: &'static str,
    /// Ряды inline-клавиатуры
    pub rows: Vec<Vec<Button>>,
}

impl StageView {
    pub fn new(stage: Stage, text: impl Into<String>, image: &'static str) -> Self {
        Self {
            stage,
            text: text.into(),
            image,
            rows: Vec::new(),
        }
    }

    pub fn with_button(mut self, label: impl Into<String>, action: Action) -> Self {
        self.rows.push(vec![Button::new(label, action)]);
        self
    }

    pub fn with_row(mut self, row: Vec<Button>) -> Self {
        self.rows.push(row);
        self
    }

    /// Все действия экрана (для проверок в тестах).
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.rows.iter().flatten().map(|b| &b.action)
    }
}
