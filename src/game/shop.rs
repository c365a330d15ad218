//! Единый параметризованный магазин.
//!
//! Все четыре магазинных экрана обучения — один и тот же поток с разными
//! параметрами: какие категории видны, что разрешено покупать и без чего
//! не выпустят наружу.

use rusqlite::Connection;

use super::action::Action;
use super::stage::Stage;
use super::view::{Button, StageView};
use crate::core::{AppResult, GameError};
use crate::storage::catalog::{self, Category};
use crate::storage::inventory;

/// Параметры магазинного экрана.
pub struct ShopContext {
    pub stage: Stage,
    /// Этап, на который ведет успешный выход
    pub after_exit: Stage,
    /// Категории на витрине
    pub categories: &'static [Category],
    /// Товары, которые разрешено покупать (по названию)
    pub allowed: &'static [&'static str],
    /// Без этих товаров из магазина не выпустят
    pub required: &'static [&'static str],
    /// Текст витрины
    pub banner: &'static str,
    /// Иллюстрация витрины
    pub image: &'static str,
    /// Подпись кнопки выхода
    pub exit_label: &'static str,
}

const ALL_CATEGORIES: &[Category] = &[
    Category::Knives,
    Category::Punches,
    Category::Edgers,
    Category::Materials,
    Category::Hardware,
    Category::Chemistry,
    Category::Threads,
];

/// Учебный магазин: первый визит с Геной.
pub static TUTORIAL_SHOP: ShopContext = ShopContext {
    stage: Stage::InShopMenu,
    after_exit: Stage::WaitingForBeltStart,
    categories: ALL_CATEGORIES,
    allowed: &[
        "Канцелярский нож",
        "Высечные пробойники",
        "Мультитул 3 в 1",
        "Дешевая ременная заготовка",
        "Пчелиный воск",
        "Дешевая фурнитура для ремней",
        "Швейные МосНитки",
    ],
    required: &[
        "Канцелярский нож",
        "Высечные пробойники",
        "Мультитул 3 в 1",
        "Дешевая ременная заготовка",
        "Дешевая фурнитура для ремней",
    ],
    banner: "🏪 Вы в магазине кожевенных товаров.\n\nГена кивает на витрину:\n— Бери только то, без чего не обойтись. Остальное наживешь, когда руки окрепнут.",
    image: "tutorial/shop_menu.jpg",
    exit_label: "🚪 Выйти из магазина",
};

/// Магазин после первого ремня: закупка под картхолдер.
pub static HOLDER_SHOP: ShopContext = ShopContext {
    stage: Stage::InShopAfterTutorial,
    after_exit: Stage::WaitingForHolderStart,
    categories: ALL_CATEGORIES,
    allowed: &["Строчные пробойники PFG", "Кожа для галантереи (дешевая)", "Швейные МосНитки"],
    required: &["Строчные пробойники PFG", "Кожа для галантереи (дешевая)", "Швейные МосНитки"],
    banner: "🏪 Знакомый магазин. Продавец узнал вас и улыбается.\n\nДля картхолдера нужны строчные пробойники, тонкая кожа и нитки.",
    image: "tutorial/shop_after.jpg",
    exit_label: "🚪 Выйти из магазина",
};

/// Закупка под первую сумку.
pub static BAG_SHOP: ShopContext = ShopContext {
    stage: Stage::InShopBagMaterials,
    after_exit: Stage::WaitingForBagMaterialsSelection,
    categories: &[Category::Hardware, Category::Chemistry],
    allowed: &["Дешевая фурнитура для сумок", "Пчелиный воск"],
    required: &["Дешевая фурнитура для сумок", "Пчелиный воск"],
    banner: "🏪 Забежали за мелочевкой для сумки: фурнитура и воск, больше ничего не требуется.",
    image: "tutorial/bag_shop.jpg",
    exit_label: "🏠 Вернуться домой",
};

/// Закупка под вторую попытку сумки.
pub static BAG_RETRY_SHOP: ShopContext = ShopContext {
    stage: Stage::InShopBagRetry,
    after_exit: Stage::WaitingForBagRetryStart,
    categories: &[Category::Materials, Category::Hardware, Category::Threads, Category::Chemistry],
    allowed: &[
        "Кожа для сумок (средняя)",
        "Средняя фурнитура для сумок",
        "Синтетические нитки",
        "Масловосковые смеси",
    ],
    required: &[
        "Кожа для сумок (средняя)",
        "Средняя фурнитура для сумок",
        "Синтетические нитки",
        "Масловосковые смеси",
    ],
    banner: "🏪 На этот раз вы пришли со списком: кожа поплотнее, крепкая фурнитура, хорошие нитки и финиш для уреза.",
    image: "tutorial/bag_retry_shop.jpg",
    exit_label: "🏠 Вернуться домой",
};

/// Контекст магазина для этапа, если этап — магазинный.
pub fn context_for(stage: Stage) -> Option<&'static ShopContext> {
    match stage {
        Stage::InShopMenu => Some(&TUTORIAL_SHOP),
        Stage::InShopAfterTutorial => Some(&HOLDER_SHOP),
        Stage::InShopBagMaterials => Some(&BAG_SHOP),
        Stage::InShopBagRetry => Some(&BAG_RETRY_SHOP),
        _ => None,
    }
}

/// Витрина магазина: баннер, баланс, кнопки категорий и выход.
pub fn root_view(ctx: &'static ShopContext, balance: i64) -> StageView {
    let mut view = StageView::new(
        ctx.stage,
        format!("{}\n\n💰 Баланс: {balance} монет", ctx.banner),
        ctx.image,
    );
    let mut row = Vec::new();
    for &category in ctx.categories {
        row.push(Button::new(category.button_label(), Action::OpenCategory(category)));
        if row.len() == 2 {
            view.rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        view.rows.push(row);
    }
    view.rows.push(vec![Button::new(ctx.exit_label, Action::LeaveShop)]);
    view
}

/// Экран категории: каждый товар — строка «название — цена», недоступные
/// помечаются, живую `buy:`-кнопку получают только разрешенные и доступные
/// по деньгам товары.
pub fn category_view(
    conn: &Connection,
    ctx: &'static ShopContext,
    category: Category,
    player_id: i64,
    balance: i64,
) -> AppResult<StageView> {
    let items = catalog::items_by_category(conn, category)?;
    let mut view = StageView::new(
        ctx.stage,
        format!("📦 {category}\n\n💰 Баланс: {balance} монет"),
        ctx.image,
    );

    for item in items {
        let owned = inventory::has_sku(conn, player_id, &item.sku)?;
        let allowed = ctx.allowed.contains(&item.name.as_str());
        let affordable = balance >= item.price;

        let mut label = format!("{} — {} монет", item.name, item.price);
        let action = if owned {
            label.push_str(" ✅");
            Action::Locked
        } else if !allowed {
            label.push_str(" 🔒");
            Action::Locked
        } else if !affordable {
            label.push_str(" ❌");
            Action::TooExpensive
        } else {
            Action::Buy(item.sku.clone())
        };
        view.rows.push(vec![Button::new(label, action)]);
    }

    view.rows.push(vec![Button::new("⬅️ Назад", Action::BackToShop)]);
    Ok(view)
}

/// Обязательные товары, которых еще нет в инвентаре.
pub fn missing_required(conn: &Connection, ctx: &ShopContext, player_id: i64) -> AppResult<Vec<String>> {
    let owned = inventory::names(conn, player_id)?;
    Ok(ctx
        .required
        .iter()
        .filter(|name| !owned.iter().any(|o| o == *name))
        .map(|name| name.to_string())
        .collect())
}

/// Проверка выходных ворот: либо пусто, либо ошибка со списком недостающего.
pub fn check_exit_gate(conn: &Connection, ctx: &ShopContext, player_id: i64) -> AppResult<()> {
    let missing = missing_required(conn, ctx, player_id)?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GameError::MissingItems(missing).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        migrations::run_migrations_for_test(&mut conn).unwrap();
        catalog::seed(&conn).unwrap();
        // FK: строки инвентаря ссылаются на players(id)
        conn.execute_batch(
            "INSERT INTO users (id, telegram_id) VALUES (1, 1000);
             INSERT INTO players (id, user_id, name, class) VALUES (1, 1, 'Тестер', 'Работяга');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn every_required_item_is_also_allowed() {
        for ctx in [&TUTORIAL_SHOP, &HOLDER_SHOP, &BAG_SHOP, &BAG_RETRY_SHOP] {
            for name in ctx.required {
                assert!(ctx.allowed.contains(name), "{name} required but not allowed");
            }
        }
    }

    #[test]
    fn every_allowed_item_exists_in_catalog() {
        let conn = test_conn();
        for ctx in [&TUTORIAL_SHOP, &HOLDER_SHOP, &BAG_SHOP, &BAG_RETRY_SHOP] {
            for name in ctx.allowed {
                assert!(
                    catalog::item_by_name(&conn, name).unwrap().is_some(),
                    "{name} not in catalog"
                );
            }
        }
    }

    #[test]
    fn locked_items_never_carry_live_buy_buttons() {
        let conn = test_conn();
        let view = category_view(&conn, &TUTORIAL_SHOP, Category::Knives, 1, 2000).unwrap();
        for button in view.rows.iter().flatten() {
            if let Action::Buy(sku) = &button.action {
                let item = catalog::item_by_sku(&conn, sku).unwrap().unwrap();
                assert!(TUTORIAL_SHOP.allowed.contains(&item.name.as_str()));
            }
        }
        // Дорогие ножи видны, но заперты
        assert!(view.rows.iter().flatten().any(|b| b.label.contains("🔒")));
    }

    #[test]
    fn unaffordable_allowed_item_is_marked() {
        let conn = test_conn();
        let view = category_view(&conn, &TUTORIAL_SHOP, Category::Knives, 1, 100).unwrap();
        let knife_row = view
            .rows
            .iter()
            .flatten()
            .find(|b| b.label.starts_with("Канцелярский нож"))
            .unwrap();
        assert!(knife_row.label.ends_with("❌"));
        assert_eq!(knife_row.action, Action::TooExpensive);
    }

    #[test]
    fn exit_gate_reports_exact_missing_list() {
        let conn = test_conn();
        let knife = catalog::item_by_name(&conn, "Канцелярский нож").unwrap().unwrap();
        inventory::add(&conn, 1, &knife).unwrap();

        let missing = missing_required(&conn, &TUTORIAL_SHOP, 1).unwrap();
        assert_eq!(missing.len(), TUTORIAL_SHOP.required.len() - 1);
        assert!(!missing.contains(&"Канцелярский нож".to_string()));
    }
}
