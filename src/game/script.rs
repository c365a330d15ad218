//! Сценарий обучения: тексты этапов, клавиатуры и наборы предметов для
//! каждого шага крафта.

use std::collections::BTreeSet;

use rusqlite::Connection;

use super::action::Action;
use super::shop;
use super::stage::Stage;
use super::view::{Button, StageView};
use crate::core::{AppResult, GameError};
use crate::storage::catalog::Category;
use crate::storage::inventory;

/// Инструменты ремня: ровно этот набор должен быть отмечен.
pub const BELT_TOOLS: &[&str] = &["Канцелярский нож", "Мультитул 3 в 1", "Высечные пробойники"];

/// Инструменты картхолдера. Высечные пробойники отмечать нельзя —
/// для мелкого шва нужны строчные.
pub const HOLDER_TOOLS: &[&str] = &["Канцелярский нож", "Строчные пробойники PFG", "Мультитул 3 в 1"];
pub const HOLDER_TOOLS_FORBIDDEN: &[&str] = &["Высечные пробойники"];

/// Инструменты сумки (обе попытки).
pub const BAG_TOOLS: &[&str] = &[
    "Канцелярский нож",
    "Строчные пробойники PFG",
    "Высечные пробойники",
    "Мультитул 3 в 1",
];

pub const BAG_MATERIALS: &[&str] = &["Кожа для сумок (дешевая)", "Дешевая фурнитура для сумок"];
pub const BAG_RETRY_MATERIALS: &[&str] = &["Кожа для сумок (средняя)", "Средняя фурнитура для сумок"];

/// Расход материалов после каждого крафта.
pub const BELT_CONSUME: &[&str] = &["Дешевая ременная заготовка", "Дешевая фурнитура для ремней"];
pub const HOLDER_CONSUME: &[&str] = &["Кожа для галантереи (дешевая)"];
pub const BAG1_CONSUME: &[&str] = &["Кожа для сумок (дешевая)", "Дешевая фурнитура для сумок"];
pub const BAG2_CONSUME: &[&str] = &["Кожа для сумок (средняя)", "Средняя фурнитура для сумок", "Масловосковые смеси"];

/// Остаток кожи, который «находится» перед заказом на сумку.
pub const LEFTOVER_BAG_LEATHER: &str = "Кожа для сумок (дешевая)";

const TOOL_CATEGORIES: &[Category] = &[Category::Knives, Category::Punches, Category::Edgers];
const MATERIAL_CATEGORIES: &[Category] = &[Category::Materials, Category::Hardware];

/// Шаг одиночного выбора: игрок нажимает один предмет из инвентаря.
pub struct PickStep {
    pub stage: Stage,
    pub next: Stage,
    /// Какие предметы подходят (по названию); остальное — «не нужно»
    pub accepted: &'static [&'static str],
    /// Категории инвентаря, которые показываем на экране
    pub categories: &'static [Category],
    pub prompt: &'static str,
    pub image: &'static str,
}

/// Шаг мульти-выбора: подтверждение требует ровно нужный набор.
pub struct MultiStep {
    pub stage: Stage,
    pub next: Stage,
    pub required: &'static [&'static str],
    pub forbidden: &'static [&'static str],
    pub categories: &'static [Category],
    pub prompt: &'static str,
    pub image: &'static str,
}

pub fn pick_step(stage: Stage) -> Option<&'static PickStep> {
    PICK_STEPS.iter().find(|s| s.stage == stage)
}

pub fn multi_step(stage: Stage) -> Option<&'static MultiStep> {
    MULTI_STEPS.iter().find(|s| s.stage == stage)
}

static PICK_STEPS: &[PickStep] = &[
    PickStep {
        stage: Stage::WaitingForBeltMaterials,
        next: Stage::WaitingForBeltLeather,
        accepted: &[
            "Дешевая ременная заготовка",
            "Обычная ременная заготовка",
            "Дорогая ременная заготовка",
        ],
        categories: &[Category::Materials],
        prompt: "Этап 1. Посмотрев видео пару раз, вы разложили покупки на столе.\n\nВыберите кожу для ремня:",
        image: "tutorial/belt_materials.jpg",
    },
    PickStep {
        stage: Stage::WaitingForBeltLeather,
        next: Stage::WaitingForBeltHardware,
        accepted: &["Дешевая фурнитура для ремней", "Нержавейка для ремней", "Латунная фурнитура"],
        categories: &[Category::Hardware],
        prompt: "Заготовка лежит ровно, без волн. Теперь фурнитура:",
        image: "tutorial/belt_hardware.jpg",
    },
    PickStep {
        stage: Stage::WaitingForHolderLeather,
        next: Stage::WaitingForHolderTools,
        accepted: &["Кожа для галантереи (дешевая)"],
        categories: &[Category::Materials],
        prompt: "Первый настоящий заказ — картхолдер!\n\nВыберите кожу:",
        image: "tutorial/holder_leather.jpg",
    },
    PickStep {
        stage: Stage::WaitingForHolderThreads,
        next: Stage::WaitingForHolderQuality,
        accepted: &["Швейные МосНитки", "Синтетические нитки", "Льняные нитки"],
        categories: &[Category::Threads],
        prompt: "Детали вырезаны, отверстия пробиты. Какими нитками будете шить?",
        image: "tutorial/holder_threads.jpg",
    },
    PickStep {
        stage: Stage::WaitingForBagWaxSelection,
        next: Stage::WaitingForBagThreadsSelection,
        accepted: &["Пчелиный воск"],
        categories: &[Category::Chemistry],
        prompt: "Детали сумки скроены. Чем обработать урез?",
        image: "tutorial/bag_wax.jpg",
    },
    PickStep {
        stage: Stage::WaitingForBagThreadsSelection,
        next: Stage::WaitingForBagQuality1,
        accepted: &["Швейные МосНитки", "Синтетические нитки", "Льняные нитки"],
        categories: &[Category::Threads],
        prompt: "Осталось сшить. Какие нитки возьмете?",
        image: "tutorial/bag_threads.jpg",
    },
    PickStep {
        stage: Stage::WaitingForBagRetryWax,
        next: Stage::WaitingForBagRetryThreads,
        accepted: &["Масловосковые смеси"],
        categories: &[Category::Chemistry],
        prompt: "Урез должен быть как стекло. Чем будете финишировать?",
        image: "tutorial/bag_retry_wax.jpg",
    },
    PickStep {
        stage: Stage::WaitingForBagRetryThreads,
        next: Stage::WaitingForBagQuality2,
        accepted: &["Синтетические нитки"],
        categories: &[Category::Threads],
        prompt: "Шов на виду, экономить нельзя. Какими нитками шить?",
        image: "tutorial/bag_retry_threads.jpg",
    },
];

static MULTI_STEPS: &[MultiStep] = &[
    MultiStep {
        stage: Stage::WaitingForBeltTools,
        next: Stage::WaitingForBeltAssembly,
        required: BELT_TOOLS,
        forbidden: &[],
        categories: TOOL_CATEGORIES,
        prompt: "Отметьте инструменты, которые понадобятся для ремня:",
        image: "tutorial/belt_tools.jpg",
    },
    MultiStep {
        stage: Stage::WaitingForHolderTools,
        next: Stage::WaitingForHolderThreads,
        required: HOLDER_TOOLS,
        forbidden: HOLDER_TOOLS_FORBIDDEN,
        categories: TOOL_CATEGORIES,
        prompt: "Отметьте инструменты для картхолдера. Подумайте, чем будете пробивать строчку:",
        image: "tutorial/holder_tools.jpg",
    },
    MultiStep {
        stage: Stage::WaitingForBagMaterialsSelection,
        next: Stage::WaitingForBagToolsSelection,
        required: BAG_MATERIALS,
        forbidden: &[],
        categories: MATERIAL_CATEGORIES,
        prompt: "Этап 22. Разложите материалы для сумки:",
        image: "tutorial/bag_materials.jpg",
    },
    MultiStep {
        stage: Stage::WaitingForBagToolsSelection,
        next: Stage::WaitingForBagWaxSelection,
        required: BAG_TOOLS,
        forbidden: &[],
        categories: TOOL_CATEGORIES,
        prompt: "Теперь инструменты. Для сумки понадобится все, что есть:",
        image: "tutorial/bag_tools.jpg",
    },
    MultiStep {
        stage: Stage::WaitingForBagRetryMaterials,
        next: Stage::WaitingForBagRetryTools,
        required: BAG_RETRY_MATERIALS,
        forbidden: &[],
        categories: MATERIAL_CATEGORIES,
        prompt: "Вторая попытка. Разложите новые материалы:",
        image: "tutorial/bag_retry_materials.jpg",
    },
    MultiStep {
        stage: Stage::WaitingForBagRetryTools,
        next: Stage::WaitingForBagRetryWax,
        required: BAG_TOOLS,
        forbidden: &[],
        categories: TOOL_CATEGORIES,
        prompt: "Инструменты для второй попытки:",
        image: "tutorial/bag_retry_tools.jpg",
    },
];

/// Повествовательные этапы: текст, иллюстрация и подпись «дальше»-кнопки.
fn narrative(stage: Stage) -> Option<(&'static str, &'static str, Option<&'static str>)> {
    let (text, image, label) = match stage {
        Stage::WaitingForShopEnter => (
            "Вы стоите перед небольшим магазином кожевенных товаров. За стеклом — рулоны кожи, \
             пряжки и инструменты, назначение половины из которых вам пока неизвестно.",
            "tutorial/shop_outside.jpg",
            Some("🚪 Войти в магазин"),
        ),
        Stage::WaitingForApproach => (
            "Внутри пахнет кожей и воском. У дальнего стеллажа седой мужчина неторопливо \
             перебирает пряжки и что-то бормочет себе под нос.",
            "tutorial/shop_inside.jpg",
            Some("👣 Подойти ближе"),
        ),
        Stage::WaitingForOldmanApproach => (
            "— Первый раз тут? — не оборачиваясь спрашивает он. — Меня Геной зовут. Если хочешь \
             научиться ремеслу, а не просто деньги потратить, слушай, что скажу.",
            "tutorial/oldman.jpg",
            Some("👴 Подойти к старику"),
        ),
        Stage::WaitingForShowcase => (
            "— Начинают все с ремня, — говорит Гена. — Простая вещь, а учит всему: раскрою, урезу, \
             пряжке. Пойдем, покажу, что из товара брать, а что пока не трогать.",
            "tutorial/showcase.jpg",
            Some("🛒 Посмотреть витрину"),
        ),
        Stage::WaitingForBeltStart => (
            "Вы вышли из магазина с Геной.\n\n— Ну вроде все что надо купил, вот держи ссылку на \
             одно видео, там парень показывает, как он делает ремень. Не очень профессионально, но \
             Бог с ним. Тебе хватит, чтоб понять, как работать.\n\nПопрощавшись и поблагодарив, вы \
             вернулись домой и решили сразу приняться за работу.",
            "tutorial/exit_shop.jpg",
            Some("🔨 Сделать ремень"),
        ),
        Stage::WaitingForBeltHardware => (
            "Материалы на столе. Прежде чем резать, соберите инструменты.",
            "tutorial/belt_ready.jpg",
            Some("🧰 Выбрать инструменты"),
        ),
        Stage::WaitingForBeltAssembly => (
            "Раскрой сделан, отверстия пробиты, урез обработан как смог. Осталось поставить пряжку.",
            "tutorial/belt_assembly.jpg",
            Some("🔩 Установить пряжку"),
        ),
        Stage::WaitingForBeltQuality => (
            "Пряжка на месте, винты затянуты. Ремень выглядит... как ремень. Пора честно оценить \
             результат.",
            "tutorial/belt_done.jpg",
            Some("🔍 Оценить качество"),
        ),
        Stage::WaitingForBeltSleep => (
            "🎉Качество заказа – Сносное🎉\n\nДля первой работы — вполне. Края чуть гуляют, но носить \
             можно. Глаза слипаются: время позднее.",
            "tutorial/quality_snosnoe.jpg",
            Some("😴 Лечь спать"),
        ),
        Stage::WaitingForShopReturn => (
            "Утро. Ремень при дневном свете выглядит честнее, чем ночью, но Гена просил показать \
             первую работу ему.",
            "tutorial/morning.jpg",
            Some("🏪 Вернуться в магазин"),
        ),
        Stage::WaitingForShopView => (
            "Знакомая вывеска. Гена щурится на ремень:\n— Для первого раза сгодится. Теперь попробуй \
             вещь помельче — картхолдер. Инструмент понадобится другой.",
            "tutorial/shop_again.jpg",
            Some("🛒 Посмотреть витрину"),
        ),
        Stage::WaitingForHolderStart => (
            "Закупились. Дома вас уже ждет первый настоящий заказ: знакомый Гены просил картхолдер \
             «без наворотов, но аккуратный».",
            "tutorial/holder_start.jpg",
            Some("🔨 Приступить к работе"),
        ),
        Stage::WaitingForHolderQuality => (
            "Последний стежок затянут, нитка оплавлена. Картхолдер готов.",
            "tutorial/holder_done.jpg",
            Some("🔍 Оценить качество"),
        ),
        Stage::WaitingForHolderGift => (
            "🎉Качество заказа – Хорошее🎉\n\nСтрочка ровная, карты входят плотно. Не стыдно отдавать.",
            "tutorial/quality_good.jpg",
            Some("🎁 Отдать заказчику"),
        ),
        Stage::WaitingForHolderFinal => (
            "Заказчик повертел картхолдер в руках, хмыкнул и перевел 2000 монет — вдвое больше \
             оговоренного.\n\n— За аккуратность, — коротко пояснил он.",
            "tutorial/holder_gift.jpg",
            Some("➡️ Дальше"),
        ),
        Stage::WaitingForBagStart => (
            "Слух о вас пошел: просят сумку. Как раз оставалась кожа — на небольшую сумку хватит, \
             нужна только фурнитура и воск.",
            "tutorial/bag_start.jpg",
            Some("🏪 В магазин"),
        ),
        Stage::WaitingForBagQuality1 => (
            "Сумка сшита. Что-то в ней смущает, но заказ есть заказ — несете показывать.",
            "tutorial/bag_done_1.jpg",
            Some("🔍 Оценить качество"),
        ),
        Stage::WaitingForBagRetry => (
            "Качество заказа – Брак\n\nШвы повело, кольца люфтят. Заказчик оказался премиальным \
             клиентом: брак не принял, но оплатил новые материалы и добавил 1000 монет сверху.\n\n— \
             Сделай как следует, — сказал он. — Время есть.",
            "tutorial/quality_reject.jpg",
            Some("🏪 За новыми материалами"),
        ),
        Stage::WaitingForBagRetryStart => (
            "Вооружившись качественной кожей и фурнитурой, вы чувствуете себя увереннее. На этот раз \
             вы подошли к делу более обстоятельно: нашли подробный туториал от опытного мастера и \
             заранее разложили всё необходимое на столе.",
            "tutorial/bag_retry_start.jpg",
            Some("🔨 Приступить к работе"),
        ),
        Stage::WaitingForBagQuality2 => (
            "Последний стежок. Вы выдыхаете и отставляете сумку на вытянутые руки.",
            "tutorial/bag_done_2.jpg",
            Some("🔍 Оценить качество"),
        ),
        Stage::WaitingForFinal => (
            "🎉 Обучение пройдено!\n\nЗаказчик забрал сумку и оставил первый настоящий отзыв. На двери \
             вашей каморки теперь висит табличка:\n\n«Мастерская для Души»\n\nДальше — только работа.",
            "tutorial/final.jpg",
            Some("🏁 Завершить обучение"),
        ),
        Stage::Completed => (
            "Обучение завершено. «Мастерская для Души» ждет новых заказов!",
            "tutorial/final.jpg",
            None,
        ),
        _ => return None,
    };
    Some((text, image, label))
}

/// Строит экран этапа. Для магазинов — витрина, для шагов крафта — списки
/// из инвентаря, для повествования — текст с одной кнопкой.
pub fn view(
    conn: &Connection,
    player_id: i64,
    stage: Stage,
    balance: i64,
    selected: &BTreeSet<String>,
) -> AppResult<StageView> {
    if let Some(ctx) = shop::context_for(stage) {
        return Ok(shop::root_view(ctx, balance));
    }
    if let Some(step) = pick_step(stage) {
        return pick_view(conn, player_id, step);
    }
    if let Some(step) = multi_step(stage) {
        return multi_view(conn, player_id, step, selected);
    }
    if let Some((text, image, label)) = narrative(stage) {
        let mut view = StageView::new(stage, text, image);
        if let Some(label) = label {
            view = view.with_button(label, Action::Continue);
        }
        return Ok(view);
    }
    Err(GameError::WrongStage(stage.as_str().to_string()).into())
}

fn pick_view(conn: &Connection, player_id: i64, step: &'static PickStep) -> AppResult<StageView> {
    let mut view = StageView::new(step.stage, step.prompt, step.image);
    for item in inventory::list(conn, player_id)? {
        if step.categories.iter().any(|c| c.to_string() == item.item_type) {
            view.rows
                .push(vec![Button::new(item.item_name.clone(), Action::Pick(item.item_sku))]);
        }
    }
    Ok(view)
}

fn multi_view(
    conn: &Connection,
    player_id: i64,
    step: &'static MultiStep,
    selected: &BTreeSet<String>,
) -> AppResult<StageView> {
    let mut view = StageView::new(step.stage, step.prompt, step.image);
    for item in inventory::list(conn, player_id)? {
        if step.categories.iter().any(|c| c.to_string() == item.item_type) {
            let mark = if selected.contains(&item.item_sku) { "✅" } else { "🔘" };
            view.rows.push(vec![Button::new(
                format!("{mark} {}", item.item_name),
                Action::Toggle(item.item_sku),
            )]);
        }
    }
    view.rows.push(vec![Button::new("✅ Готово", Action::ConfirmSelection)]);
    Ok(view)
}
