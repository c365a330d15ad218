//! End-to-end tests for the stage engine: guards, purchases and the full
//! tutorial walkthrough.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use strum::IntoEnumIterator;

use common::{balance_of, new_player, sku_of, stage_name_of, test_db};
use remeslo::core::{AppError, GameError};
use remeslo::game::{Action, Engine, Stage};
use remeslo::storage::{get_connection, inventory, progress};

async fn cont(engine: &Engine, player_id: i64) -> Stage {
    engine
        .handle(player_id, Action::Continue)
        .await
        .expect("continue should succeed")
        .view
        .stage
}

async fn buy(engine: &Engine, pool: &remeslo::storage::db::DbPool, player_id: i64, name: &str) {
    let sku = sku_of(pool, name);
    engine
        .handle(player_id, Action::Buy(sku))
        .await
        .unwrap_or_else(|e| panic!("buying {name} failed: {e}"));
}

async fn toggle_and_confirm(engine: &Engine, pool: &remeslo::storage::db::DbPool, player_id: i64, names: &[&str]) {
    for name in names {
        let sku = sku_of(pool, name);
        engine.handle(player_id, Action::Toggle(sku)).await.unwrap();
    }
    engine
        .handle(player_id, Action::ConfirmSelection)
        .await
        .unwrap_or_else(|e| panic!("confirming {names:?} failed: {e}"));
}

async fn pick(engine: &Engine, pool: &remeslo::storage::db::DbPool, player_id: i64, name: &str) -> Stage {
    let sku = sku_of(pool, name);
    engine
        .handle(player_id, Action::Pick(sku))
        .await
        .unwrap_or_else(|e| panic!("picking {name} failed: {e}"))
        .view
        .stage
}

fn game_error(result: Result<remeslo::game::Outcome, AppError>) -> GameError {
    match result {
        Err(AppError::Game(e)) => e,
        Err(other) => panic!("expected game error, got {other}"),
        Ok(_) => panic!("expected game error, got success"),
    }
}

#[tokio::test]
async fn exit_gate_blocks_until_required_items_bought() {
    let db = test_db();
    let player_id = new_player(&db.pool, 100);
    let engine = Engine::new(db.pool.clone());

    // Four narrative steps lead into the shop
    for _ in 0..4 {
        cont(&engine, player_id).await;
    }
    assert_eq!(stage_name_of(&db.pool, player_id), "in_shop_menu");

    let err = game_error(engine.handle(player_id, Action::LeaveShop).await);
    match err {
        GameError::MissingItems(missing) => assert_eq!(missing.len(), 5),
        other => panic!("expected MissingItems, got {other}"),
    }

    for name in [
        "Канцелярский нож",
        "Высечные пробойники",
        "Мультитул 3 в 1",
        "Дешевая ременная заготовка",
        "Дешевая фурнитура для ремней",
    ] {
        buy(&engine, &db.pool, player_id, name).await;
    }

    let outcome = engine.handle(player_id, Action::LeaveShop).await.unwrap();
    assert_eq!(outcome.view.stage, Stage::WaitingForBeltStart);
    // 300 + 280 + 250 + 150 + 100 spent out of 2000
    assert_eq!(balance_of(&db.pool, player_id), 920);
}

#[tokio::test]
async fn purchase_is_atomic_and_idempotent() {
    let db = test_db();
    let player_id = new_player(&db.pool, 101);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();

    let outcome = engine
        .handle(player_id, Action::Buy(sku_of(&db.pool, "Канцелярский нож")))
        .await
        .unwrap();
    assert!(outcome.edit);
    assert_eq!(outcome.notice.as_deref(), Some("✅ Куплено: Канцелярский нож"));
    assert_eq!(balance_of(&db.pool, player_id), 1700);

    let err = game_error(
        engine
            .handle(player_id, Action::Buy(sku_of(&db.pool, "Канцелярский нож")))
            .await,
    );
    assert!(matches!(err, GameError::AlreadyOwned(_)));
    // Refused purchase must not touch the balance
    assert_eq!(balance_of(&db.pool, player_id), 1700);
}

#[tokio::test]
async fn insufficient_funds_leaves_state_untouched() {
    let db = test_db();
    let player_id = new_player(&db.pool, 102);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();

    {
        let conn = get_connection(&db.pool).unwrap();
        progress::set_balance(&conn, player_id, 100).unwrap();
    }

    let err = game_error(
        engine
            .handle(player_id, Action::Buy(sku_of(&db.pool, "Канцелярский нож")))
            .await,
    );
    match err {
        GameError::InsufficientFunds { price, balance } => {
            assert_eq!(price, 300);
            assert_eq!(balance, 100);
        }
        other => panic!("expected InsufficientFunds, got {other}"),
    }

    let conn = get_connection(&db.pool).unwrap();
    assert_eq!(balance_of(&db.pool, player_id), 100);
    assert!(inventory::names(&conn, player_id).unwrap().is_empty());
}

#[tokio::test]
async fn locked_item_cannot_be_bought_even_with_money() {
    let db = test_db();
    let player_id = new_player(&db.pool, 103);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();

    let err = game_error(engine.handle(player_id, Action::Buy(sku_of(&db.pool, "Нож SDI"))).await);
    assert!(matches!(err, GameError::ItemLocked(_)));
    assert_eq!(balance_of(&db.pool, player_id), 2000);
}

#[tokio::test]
async fn concurrent_purchases_charge_exactly_once() {
    let db = test_db();
    let player_id = new_player(&db.pool, 104);
    let engine = Arc::new(Engine::new(db.pool.clone()));
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();

    let sku = sku_of(&db.pool, "Канцелярский нож");
    let (a, b) = tokio::join!(
        engine.handle(player_id, Action::Buy(sku.clone())),
        engine.handle(player_id, Action::Buy(sku.clone())),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one purchase should go through");
    assert_eq!(balance_of(&db.pool, player_id), 1700);
}

#[tokio::test]
async fn toggle_requires_owned_item() {
    let db = test_db();
    let player_id = new_player(&db.pool, 105);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::WaitingForBeltTools).await.unwrap();

    let err = game_error(
        engine
            .handle(player_id, Action::Toggle(sku_of(&db.pool, "Канцелярский нож")))
            .await,
    );
    assert!(matches!(err, GameError::NotNeeded(_)));
}

#[tokio::test]
async fn wrong_tool_selection_reports_missing_and_extra() {
    let db = test_db();
    let player_id = new_player(&db.pool, 106);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();
    for name in ["Канцелярский нож", "Высечные пробойники", "Мультитул 3 в 1"] {
        buy(&engine, &db.pool, player_id, name).await;
    }
    engine.force_stage(player_id, Stage::WaitingForBeltTools).await.unwrap();

    // Only the knife marked: two tools missing
    engine
        .handle(player_id, Action::Toggle(sku_of(&db.pool, "Канцелярский нож")))
        .await
        .unwrap();
    let err = game_error(engine.handle(player_id, Action::ConfirmSelection).await);
    match err {
        GameError::WrongSelection { missing, extra } => {
            assert_eq!(missing.len(), 2);
            assert!(extra.is_empty());
        }
        other => panic!("expected WrongSelection, got {other}"),
    }
    // Refusal keeps the player on the stage with the selection intact
    assert_eq!(stage_name_of(&db.pool, player_id), "waiting_for_belt_tools");
}

#[tokio::test]
async fn punch_tool_is_rejected_for_holder() {
    let db = test_db();
    let player_id = new_player(&db.pool, 107);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();
    for name in [
        "Канцелярский нож",
        "Высечные пробойники",
        "Мультитул 3 в 1",
        "Строчные пробойники PFG",
    ] {
        buy(&engine, &db.pool, player_id, name).await;
    }
    engine.force_stage(player_id, Stage::WaitingForHolderTools).await.unwrap();

    for name in ["Канцелярский нож", "Высечные пробойники", "Мультитул 3 в 1"] {
        engine
            .handle(player_id, Action::Toggle(sku_of(&db.pool, name)))
            .await
            .unwrap();
    }
    let err = game_error(engine.handle(player_id, Action::ConfirmSelection).await);
    match err {
        GameError::WrongSelection { missing, extra } => {
            assert_eq!(missing, vec!["Строчные пробойники PFG".to_string()]);
            assert_eq!(extra, vec!["Высечные пробойники".to_string()]);
        }
        other => panic!("expected WrongSelection, got {other}"),
    }
}

#[tokio::test]
async fn resume_renders_the_saved_stage() {
    let db = test_db();
    let player_id = new_player(&db.pool, 108);
    let engine = Engine::new(db.pool.clone());

    for stage in Stage::iter() {
        {
            let conn = get_connection(&db.pool).unwrap();
            progress::set_stage(&conn, player_id, stage).unwrap();
        }
        let outcome = engine.resume(player_id).await.unwrap();
        assert_eq!(outcome.view.stage, stage, "resume must land on {}", stage.as_str());
    }
}

#[tokio::test]
async fn unknown_stage_falls_back_to_entry() {
    let db = test_db();
    let player_id = new_player(&db.pool, 109);
    let engine = Engine::new(db.pool.clone());

    {
        let conn = get_connection(&db.pool).unwrap();
        conn.execute(
            "UPDATE tutorial_progress SET current_stage = 'waiting_for_dragon' WHERE player_id = ?1",
            [player_id],
        )
        .unwrap();
    }

    let outcome = engine.resume(player_id).await.unwrap();
    assert_eq!(outcome.view.stage, Stage::WaitingForShopEnter);
    assert_eq!(stage_name_of(&db.pool, player_id), "waiting_for_shop_enter");
}

#[tokio::test]
async fn restart_wipes_progress_and_inventory() {
    let db = test_db();
    let player_id = new_player(&db.pool, 110);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();
    buy(&engine, &db.pool, player_id, "Канцелярский нож").await;

    let outcome = engine.start_tutorial(player_id).await.unwrap();
    assert_eq!(outcome.view.stage, Stage::WaitingForShopEnter);
    assert_eq!(balance_of(&db.pool, player_id), 2000);
    let conn = get_connection(&db.pool).unwrap();
    assert!(inventory::names(&conn, player_id).unwrap().is_empty());
}

#[tokio::test]
async fn continue_on_wrong_stage_is_refused() {
    let db = test_db();
    let player_id = new_player(&db.pool, 111);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();

    let err = game_error(engine.handle(player_id, Action::Continue).await);
    assert!(matches!(err, GameError::WrongStage(_)));
}

#[tokio::test]
async fn full_tutorial_walkthrough() {
    let db = test_db();
    let player_id = new_player(&db.pool, 112);
    let engine = Engine::new(db.pool.clone());

    // Into the first shop
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForApproach);
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForOldmanApproach);
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForShowcase);
    assert_eq!(cont(&engine, player_id).await, Stage::InShopMenu);

    for name in [
        "Канцелярский нож",
        "Высечные пробойники",
        "Мультитул 3 в 1",
        "Дешевая ременная заготовка",
        "Дешевая фурнитура для ремней",
    ] {
        buy(&engine, &db.pool, player_id, name).await;
    }
    assert_eq!(
        engine.handle(player_id, Action::LeaveShop).await.unwrap().view.stage,
        Stage::WaitingForBeltStart
    );
    assert_eq!(balance_of(&db.pool, player_id), 920);

    // Belt
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForBeltMaterials);
    assert_eq!(
        pick(&engine, &db.pool, player_id, "Дешевая ременная заготовка").await,
        Stage::WaitingForBeltLeather
    );
    assert_eq!(
        pick(&engine, &db.pool, player_id, "Дешевая фурнитура для ремней").await,
        Stage::WaitingForBeltHardware
    );
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForBeltTools);
    toggle_and_confirm(
        &engine,
        &db.pool,
        player_id,
        &["Канцелярский нож", "Мультитул 3 в 1", "Высечные пробойники"],
    )
    .await;
    assert_eq!(stage_name_of(&db.pool, player_id), "waiting_for_belt_assembly");
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForBeltQuality);
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForBeltSleep);

    // Belt materials consumed, tools survive
    {
        let conn = get_connection(&db.pool).unwrap();
        let names = inventory::names(&conn, player_id).unwrap();
        assert!(!names.contains(&"Дешевая ременная заготовка".to_string()));
        assert!(names.contains(&"Канцелярский нож".to_string()));
    }

    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForShopReturn);
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForShopView);
    assert_eq!(cont(&engine, player_id).await, Stage::InShopAfterTutorial);

    // Holder shopping and craft
    for name in ["Строчные пробойники PFG", "Кожа для галантереи (дешевая)", "Швейные МосНитки"] {
        buy(&engine, &db.pool, player_id, name).await;
    }
    assert_eq!(
        engine.handle(player_id, Action::LeaveShop).await.unwrap().view.stage,
        Stage::WaitingForHolderStart
    );
    assert_eq!(balance_of(&db.pool, player_id), 120);

    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForHolderLeather);
    assert_eq!(
        pick(&engine, &db.pool, player_id, "Кожа для галантереи (дешевая)").await,
        Stage::WaitingForHolderTools
    );
    toggle_and_confirm(
        &engine,
        &db.pool,
        player_id,
        &["Канцелярский нож", "Строчные пробойники PFG", "Мультитул 3 в 1"],
    )
    .await;
    assert_eq!(
        pick(&engine, &db.pool, player_id, "Швейные МосНитки").await,
        Stage::WaitingForHolderQuality
    );
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForHolderGift);
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForHolderFinal);
    // The generous customer pays 2000
    assert_eq!(balance_of(&db.pool, player_id), 2120);

    // Leftover bag leather shows up before the bag order
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForBagStart);
    {
        let conn = get_connection(&db.pool).unwrap();
        assert!(inventory::has_name(&conn, player_id, "Кожа для сумок (дешевая)").unwrap());
    }

    // First bag
    assert_eq!(cont(&engine, player_id).await, Stage::InShopBagMaterials);
    for name in ["Дешевая фурнитура для сумок", "Пчелиный воск"] {
        buy(&engine, &db.pool, player_id, name).await;
    }
    assert_eq!(
        engine.handle(player_id, Action::LeaveShop).await.unwrap().view.stage,
        Stage::WaitingForBagMaterialsSelection
    );
    toggle_and_confirm(
        &engine,
        &db.pool,
        player_id,
        &["Кожа для сумок (дешевая)", "Дешевая фурнитура для сумок"],
    )
    .await;
    toggle_and_confirm(
        &engine,
        &db.pool,
        player_id,
        &[
            "Канцелярский нож",
            "Строчные пробойники PFG",
            "Высечные пробойники",
            "Мультитул 3 в 1",
        ],
    )
    .await;
    assert_eq!(
        pick(&engine, &db.pool, player_id, "Пчелиный воск").await,
        Stage::WaitingForBagThreadsSelection
    );
    assert_eq!(
        pick(&engine, &db.pool, player_id, "Швейные МосНитки").await,
        Stage::WaitingForBagQuality1
    );
    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForBagRetry);
    // Premium client pays 1000 on top of the refused bag
    assert_eq!(balance_of(&db.pool, player_id), 2690);

    // Second bag
    assert_eq!(cont(&engine, player_id).await, Stage::InShopBagRetry);
    for name in [
        "Кожа для сумок (средняя)",
        "Средняя фурнитура для сумок",
        "Синтетические нитки",
        "Масловосковые смеси",
    ] {
        buy(&engine, &db.pool, player_id, name).await;
    }
    assert_eq!(
        engine.handle(player_id, Action::LeaveShop).await.unwrap().view.stage,
        Stage::WaitingForBagRetryStart
    );
    assert_eq!(balance_of(&db.pool, player_id), 500);

    assert_eq!(cont(&engine, player_id).await, Stage::WaitingForBagRetryMaterials);
    toggle_and_confirm(
        &engine,
        &db.pool,
        player_id,
        &["Кожа для сумок (средняя)", "Средняя фурнитура для сумок"],
    )
    .await;
    toggle_and_confirm(
        &engine,
        &db.pool,
        player_id,
        &[
            "Канцелярский нож",
            "Строчные пробойники PFG",
            "Высечные пробойники",
            "Мультитул 3 в 1",
        ],
    )
    .await;
    assert_eq!(
        pick(&engine, &db.pool, player_id, "Масловосковые смеси").await,
        Stage::WaitingForBagRetryWax
    );
    assert_eq!(
        pick(&engine, &db.pool, player_id, "Синтетические нитки").await,
        Stage::WaitingForBagQuality2
    );

    let outcome = engine.handle(player_id, Action::Continue).await.unwrap();
    assert_eq!(outcome.view.stage, Stage::WaitingForFinal);
    assert!(outcome.view.text.starts_with("Качество заказа – "));

    assert_eq!(cont(&engine, player_id).await, Stage::Completed);

    let conn = get_connection(&db.pool).unwrap();
    let record = progress::get(&conn, player_id).unwrap().unwrap();
    assert!(record.is_completed);
    assert_eq!(record.current_stage, "completed");
    assert!(record.balance >= 0);
}

#[tokio::test]
async fn tight_budget_walkthrough_stays_solvent() {
    let db = test_db();
    let player_id = new_player(&db.pool, 113);
    let engine = Engine::new(db.pool.clone());
    {
        let conn = get_connection(&db.pool).unwrap();
        progress::set_balance(&conn, player_id, 1500).unwrap();
    }

    for _ in 0..4 {
        cont(&engine, player_id).await;
    }
    for name in [
        "Канцелярский нож",
        "Высечные пробойники",
        "Мультитул 3 в 1",
        "Дешевая ременная заготовка",
        "Дешевая фурнитура для ремней",
    ] {
        buy(&engine, &db.pool, player_id, name).await;
    }
    // 1500 - 1080: even the tight budget covers the mandatory list
    assert_eq!(balance_of(&db.pool, player_id), 420);

    // But the wax is out of reach after a spree
    {
        let conn = get_connection(&db.pool).unwrap();
        progress::set_balance(&conn, player_id, 50).unwrap();
    }
    let err = game_error(
        engine
            .handle(player_id, Action::Buy(sku_of(&db.pool, "Пчелиный воск")))
            .await,
    );
    assert!(matches!(err, GameError::InsufficientFunds { .. }));
}

#[tokio::test]
async fn category_browsing_edits_in_place() {
    let db = test_db();
    let player_id = new_player(&db.pool, 114);
    let engine = Engine::new(db.pool.clone());
    engine.force_stage(player_id, Stage::InShopMenu).await.unwrap();

    let outcome = engine
        .handle(player_id, Action::OpenCategory(remeslo::storage::catalog::Category::Knives))
        .await
        .unwrap();
    assert!(outcome.edit);
    assert!(outcome.view.text.contains("Ножи"));

    let outcome = engine.handle(player_id, Action::BackToShop).await.unwrap();
    assert!(outcome.edit);
}
