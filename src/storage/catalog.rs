//! Каталог магазина: товары, категории и генерация SKU.

use rusqlite::{Connection, OptionalExtension, Row};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::core::AppResult;

/// Категории товаров мастерской. Сериализация совпадает с русскими
/// названиями, под которыми категории хранятся в базе.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Category {
    #[strum(serialize = "Ножи")]
    Knives,
    #[strum(serialize = "Пробойники")]
    Punches,
    #[strum(serialize = "Торцбилы")]
    Edgers,
    #[strum(serialize = "Материалы")]
    Materials,
    #[strum(serialize = "Фурнитура")]
    Hardware,
    #[strum(serialize = "Химия")]
    Chemistry,
    #[strum(serialize = "Нитки")]
    Threads,
}

impl Category {
    /// Префикс SKU для категории.
    pub fn sku_prefix(self) -> &'static str {
        match self {
            Self::Knives => "KNIFE",
            Self::Punches => "PUNCH",
            Self::Edgers => "EDGE",
            Self::Materials => "MAT",
            Self::Hardware => "HW",
            Self::Chemistry => "CHEM",
            Self::Threads => "THREAD",
        }
    }

    /// Короткий код для callback-данных (SKU-префикс уже уникален).
    pub fn code(self) -> &'static str {
        self.sku_prefix()
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|c| c.sku_prefix() == code)
    }

    /// Кнопка категории в магазине.
    pub fn button_label(self) -> String {
        let icon = match self {
            Self::Knives => "🔪",
            Self::Punches => "🕳",
            Self::Edgers => "🛠",
            Self::Materials => "🟫",
            Self::Hardware => "🔩",
            Self::Chemistry => "🧴",
            Self::Threads => "🧵",
        };
        format!("{icon} {self}")
    }
}

/// Товар каталога.
#[derive(Debug, Clone)]
pub struct ShopItem {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub category: Category,
    pub price: i64,
    pub available_in_tutorial: bool,
    pub image_path: Option<String>,
    pub durability: i64,
    pub description: Option<String>,
}

impl ShopItem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let category: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            sku: row.get(1)?,
            name: row.get(2)?,
            category: category.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
            price: row.get(4)?,
            available_in_tutorial: row.get::<_, i64>(5)? != 0,
            image_path: row.get(6)?,
            durability: row.get(7)?,
            description: row.get(8)?,
        })
    }
}

const SELECT_ITEM: &str = "SELECT id, sku, name, category, price, available_in_tutorial, image_path, durability, \
                           description FROM shop_items";

/// Генерирует SKU вида `PREFIX_ФРАГМЕНТ`: первые три буквы максимум двух
/// первых слов названия, в верхнем регистре. Коллизии получают суффикс
/// `_1`, `_2`, … в порядке присвоения.
pub fn generate_sku(category: Category, name: &str, taken: &[String]) -> String {
    let fragment: String = name
        .split_whitespace()
        .take(2)
        .flat_map(|word| word.chars().take(3))
        .collect::<String>()
        .to_uppercase();

    let base = format!("{}_{}", category.sku_prefix(), fragment);
    if !taken.contains(&base) {
        return base;
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Канонический каталог: (название, категория, цена, доступен в обучении,
/// прочность, описание).
#[rustfmt::skip]
const SEED_ITEMS: &[(&str, Category, i64, bool, i64, &str)] = &[
    ("Канцелярский нож", Category::Knives, 300, true, 5, "Простой нож для первых резов"),
    ("Нож SDI", Category::Knives, 900, false, 15, "Надежный нож для раскроя"),
    ("Шорный нож", Category::Knives, 3600, false, 30, "Профессиональный шорный нож"),
    ("Высечные пробойники", Category::Punches, 280, true, 8, "Базовый набор высечных пробойников"),
    ("Строчные пробойники PFG", Category::Punches, 400, false, 20, "Строчные пробойники для ровного шва"),
    ("Пробойники Wuta", Category::Punches, 840, false, 20, "Качественные пробойники Wuta"),
    ("Пробойники Sinabroks", Category::Punches, 3360, false, 50, "Премиальные пробойники Sinabroks"),
    ("Мультитул 3 в 1", Category::Edgers, 250, true, 10, "Торцбил, биговка и канавкорез в одном"),
    ("Торцбил Wuta", Category::Edgers, 750, false, 25, "Торцбил Wuta"),
    ("Профессиональный торцбил", Category::Edgers, 3000, false, 50, "Торцбил для серийной работы"),
    ("Дешевая ременная заготовка", Category::Materials, 150, true, 1, "Кожа с дефектами, но для учебы сойдет"),
    ("Кожа для галантереи (дешевая)", Category::Materials, 250, false, 1, "Тонкая кожа для мелких изделий"),
    ("Обычная ременная заготовка", Category::Materials, 450, false, 1, "Ровная заготовка без дефектов"),
    ("Кожа для сумок (дешевая)", Category::Materials, 600, false, 1, "Жесткая кожа с неровным прокрасом"),
    ("Кожа для сумок (средняя)", Category::Materials, 900, false, 1, "Плотная кожа хорошей выделки"),
    ("Дорогая ременная заготовка", Category::Materials, 1800, false, 1, "Итальянская кожа растительного дубления"),
    ("Дешевая фурнитура для ремней", Category::Hardware, 100, true, 1, "Пряжка и винты из сплава"),
    ("Нержавейка для ремней", Category::Hardware, 300, false, 1, "Фурнитура из нержавеющей стали"),
    ("Дешевая фурнитура для сумок", Category::Hardware, 350, false, 1, "Кольца и карабины из сплава"),
    ("Средняя фурнитура для сумок", Category::Hardware, 600, false, 1, "Крепкая фурнитура без люфта"),
    ("Латунная фурнитура", Category::Hardware, 1200, false, 1, "Литая латунь, стареет красиво"),
    ("Пчелиный воск", Category::Chemistry, 80, true, 1, "Воск для обработки уреза и нити"),
    ("Масловосковые смеси", Category::Chemistry, 240, false, 1, "Финиш для уреза и кожи"),
    ("Профессиональная косметика", Category::Chemistry, 960, false, 1, "Линейка профессиональных финишей"),
    ("Швейные МосНитки", Category::Threads, 150, true, 1, "Обычные швейные нитки"),
    ("Синтетические нитки", Category::Threads, 450, false, 1, "Плоские вощеные нитки"),
    ("Льняные нитки", Category::Threads, 1800, false, 1, "Льняная нить под вощение"),
];

/// Идемпотентно заполняет каталог. Существующие товары (по названию) не
/// трогаем, SKU назначаются детерминированно в порядке списка.
pub fn seed(conn: &Connection) -> AppResult<usize> {
    let mut taken: Vec<String> = {
        let mut stmt = conn.prepare("SELECT sku FROM shop_items")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<_, _>>()?
    };

    let mut inserted = 0;
    for &(name, category, price, tutorial, durability, description) in SEED_ITEMS {
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM shop_items WHERE name = ?1",
            [name],
            |row| Ok(row.get::<_, i64>(0)? > 0),
        )?;
        if exists {
            continue;
        }

        let sku = generate_sku(category, name, &taken);
        conn.execute(
            "INSERT INTO shop_items (sku, name, category, price, available_in_tutorial, image_path, durability, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                sku,
                name,
                category.to_string(),
                price,
                tutorial as i64,
                format!("items/{}.jpg", sku.to_lowercase()),
                durability,
                description,
            ],
        )?;
        taken.push(sku);
        inserted += 1;
    }

    if inserted > 0 {
        log::info!("seeded {inserted} catalog items");
    }
    Ok(inserted)
}

/// Товар по SKU.
pub fn item_by_sku(conn: &Connection, sku: &str) -> AppResult<Option<ShopItem>> {
    let item = conn
        .query_row(&format!("{SELECT_ITEM} WHERE sku = ?1"), [sku], ShopItem::from_row)
        .optional()?;
    Ok(item)
}

/// Товар по точному названию.
pub fn item_by_name(conn: &Connection, name: &str) -> AppResult<Option<ShopItem>> {
    let item = conn
        .query_row(&format!("{SELECT_ITEM} WHERE name = ?1"), [name], ShopItem::from_row)
        .optional()?;
    Ok(item)
}

/// Товары категории, отсортированные по цене.
pub fn items_by_category(conn: &Connection, category: Category) -> AppResult<Vec<ShopItem>> {
    let mut stmt = conn.prepare(&format!("{SELECT_ITEM} WHERE category = ?1 ORDER BY price ASC"))?;
    let rows = stmt.query_map([category.to_string()], ShopItem::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}
