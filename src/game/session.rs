//! Эфемерное состояние игрока между callback-запросами.
//!
//! Набор отмеченных предметов мульти-выбора и открытая категория магазина
//! живут только в памяти: при рестарте бота игрок просто отмечает заново.

use std::collections::BTreeSet;

use dashmap::DashMap;

use crate::storage::catalog::Category;

#[derive(Default)]
pub struct Sessions {
    selections: DashMap<i64, BTreeSet<String>>,
    open_category: DashMap<i64, Category>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Переключает SKU в наборе; возвращает `true`, если предмет теперь
    /// отмечен.
    pub fn toggle(&self, player_id: i64, sku: &str) -> bool {
        let mut set = self.selections.entry(player_id).or_default();
        if set.remove(sku) {
            false
        } else {
            set.insert(sku.to_string());
            true
        }
    }

    pub fn selected(&self, player_id: i64) -> BTreeSet<String> {
        self.selections.get(&player_id).map(|s| s.clone()).unwrap_or_default()
    }

    pub fn clear_selection(&self, player_id: i64) {
        self.selections.remove(&player_id);
    }

    pub fn open_category(&self, player_id: i64, category: Category) {
        self.open_category.insert(player_id, category);
    }

    pub fn current_category(&self, player_id: i64) -> Option<Category> {
        self.open_category.get(&player_id).map(|c| *c)
    }

    pub fn close_category(&self, player_id: i64) {
        self.open_category.remove(&player_id);
    }

    /// Сбрасывает все эфемерное состояние игрока (новая игра, смена этапа).
    pub fn reset(&self, player_id: i64) {
        self.clear_selection(player_id);
        self.close_category(player_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_is_an_involution() {
        let sessions = Sessions::new();
        let before = sessions.selected(1);

        assert!(sessions.toggle(1, "KNIFE_КАННОЖ"));
        assert!(!sessions.toggle(1, "KNIFE_КАННОЖ"));

        assert_eq!(sessions.selected(1), before);
    }

    #[test]
    fn selections_are_per_player() {
        let sessions = Sessions::new();
        sessions.toggle(1, "A");
        sessions.toggle(2, "B");
        assert!(sessions.selected(1).contains("A"));
        assert!(!sessions.selected(1).contains("B"));
    }

    #[test]
    fn reset_clears_everything() {
        let sessions = Sessions::new();
        sessions.toggle(1, "A");
        sessions.open_category(1, Category::Knives);
        sessions.reset(1);
        assert!(sessions.selected(1).is_empty());
        assert!(sessions.current_category(1).is_none());
    }
}
