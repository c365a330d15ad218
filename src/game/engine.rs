//! Движок этапов: принимает действие игрока, проверяет охранные условия и
//! атомарно применяет переход.
//!
//! Инварианты:
//! - одно действие игрока в один момент времени (async-замок на игрока);
//! - каждый переход — одна транзакция `BEGIN IMMEDIATE`: списание монет и
//!   запись в инвентарь не расходятся;
//! - отказ охраны не меняет состояние, игрок остается на этапе.

use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use rusqlite::{Connection, TransactionBehavior};
use tokio::sync::Mutex;

use super::action::Action;
use super::script;
use super::session::Sessions;
use super::shop::{self, ShopContext};
use super::stage::Stage;
use super::view::StageView;
use crate::core::config::economy;
use crate::core::{AppResult, GameError};
use crate::storage::db::{self, DbPool};
use crate::storage::{catalog, inventory, progress};

/// Результат успешно примененного действия.
#[derive(Debug)]
pub struct Outcome {
    pub view: StageView,
    /// Отредактировать текущее сообщение вместо отправки нового
    pub edit: bool,
    /// Короткий ответ на callback (не alert)
    pub notice: Option<String>,
}

impl Outcome {
    fn screen(view: StageView) -> Self {
        Self {
            view,
            edit: false,
            notice: None,
        }
    }

    fn edit(view: StageView) -> Self {
        Self {
            view,
            edit: true,
            notice: None,
        }
    }
}

pub struct Engine {
    pool: DbPool,
    sessions: Sessions,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            sessions: Sessions::new(),
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, player_id: i64) -> Arc<Mutex<()>> {
        self.locks.entry(player_id).or_default().clone()
    }

    /// Применяет действие игрока. Вся обработка идет под замком игрока,
    /// занятая база повторяется с задержкой.
    pub async fn handle(&self, player_id: i64, action: Action) -> AppResult<Outcome> {
        let lock = self.lock_for(player_id);
        let _guard = lock.lock().await;

        db::with_busy_retry(|| {
            let mut conn = db::get_connection(&self.pool)?;
            self.apply(&mut conn, player_id, action.clone())
        })
        .await
    }

    /// Запускает обучение заново: прогресс и инвентарь стираются.
    pub async fn start_tutorial(&self, player_id: i64) -> AppResult<Outcome> {
        let lock = self.lock_for(player_id);
        let _guard = lock.lock().await;

        let conn = db::get_connection(&self.pool)?;
        progress::init(&conn, player_id)?;
        self.sessions.reset(player_id);
        let view = self.render(&conn, player_id, Stage::entry())?;
        Ok(Outcome::screen(view))
    }

    /// Восстанавливает экран по сохраненному этапу. Неизвестное имя этапа
    /// не роняет игрока: откатываемся на начальный экран.
    pub async fn resume(&self, player_id: i64) -> AppResult<Outcome> {
        let lock = self.lock_for(player_id);
        let _guard = lock.lock().await;

        let conn = db::get_connection(&self.pool)?;
        let record = progress::require(&conn, player_id)?;
        let stage = match record.stage() {
            Some(stage) => stage,
            None => {
                log::warn!(
                    "player {player_id}: unknown stage '{}', resuming from entry",
                    record.current_stage
                );
                progress::set_stage(&conn, player_id, Stage::entry())?;
                Stage::entry()
            }
        };
        let view = self.render(&conn, player_id, stage)?;
        Ok(Outcome::screen(view))
    }

    /// Принудительный перевод на этап (админская команда).
    pub async fn force_stage(&self, player_id: i64, stage: Stage) -> AppResult<Outcome> {
        let lock = self.lock_for(player_id);
        let _guard = lock.lock().await;

        let conn = db::get_connection(&self.pool)?;
        progress::set_stage(&conn, player_id, stage)?;
        self.sessions.reset(player_id);
        let view = self.render(&conn, player_id, stage)?;
        Ok(Outcome::screen(view))
    }

    fn apply(&self, conn: &mut Connection, player_id: i64, action: Action) -> AppResult<Outcome> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = self.transition(&tx, player_id, action)?;
        tx.commit()?;
        Ok(outcome)
    }

    fn transition(&self, conn: &Connection, player_id: i64, action: Action) -> AppResult<Outcome> {
        let record = progress::require(conn, player_id)?;
        let stage = record.stage().unwrap_or_else(|| {
            log::warn!(
                "player {player_id}: unknown stage '{}', treating as entry",
                record.current_stage
            );
            Stage::entry()
        });
        let balance = record.balance;

        match action {
            Action::Locked => Err(GameError::ItemLocked(String::new()).into()),
            Action::TooExpensive => Err(GameError::InsufficientFunds { price: 0, balance }.into()),

            Action::OpenCategory(category) => {
                let ctx = shop_context(stage)?;
                if !ctx.categories.contains(&category) {
                    return Err(GameError::WrongStage(stage.as_str().to_string()).into());
                }
                self.sessions.open_category(player_id, category);
                let view = shop::category_view(conn, ctx, category, player_id, balance)?;
                Ok(Outcome::edit(view))
            }

            Action::BackToShop => {
                let ctx = shop_context(stage)?;
                self.sessions.close_category(player_id);
                Ok(Outcome::edit(shop::root_view(ctx, balance)))
            }

            Action::Buy(sku) => {
                let ctx = shop_context(stage)?;
                self.purchase(conn, ctx, player_id, &sku, balance)
            }

            Action::LeaveShop => {
                let ctx = shop_context(stage)?;
                shop::check_exit_gate(conn, ctx, player_id)?;
                self.sessions.reset(player_id);
                progress::set_stage(conn, player_id, ctx.after_exit)?;
                let view = self.render(conn, player_id, ctx.after_exit)?;
                Ok(Outcome::screen(view))
            }

            Action::Toggle(sku) => {
                let step =
                    script::multi_step(stage).ok_or_else(|| GameError::WrongStage(stage.as_str().to_string()))?;
                if !inventory::has_sku(conn, player_id, &sku)? {
                    return Err(GameError::NotNeeded(sku).into());
                }
                self.sessions.toggle(player_id, &sku);
                let selected = self.sessions.selected(player_id);
                let view = script::view(conn, player_id, step.stage, balance, &selected)?;
                Ok(Outcome::edit(view))
            }

            Action::ConfirmSelection => {
                let step =
                    script::multi_step(stage).ok_or_else(|| GameError::WrongStage(stage.as_str().to_string()))?;
                let selected = self.sessions.selected(player_id);

                let mut selected_names = Vec::new();
                for sku in &selected {
                    let item = catalog::item_by_sku(conn, sku)?
                        .ok_or_else(|| GameError::UnknownItem(sku.clone()))?;
                    selected_names.push(item.name);
                }

                let missing: Vec<String> = step
                    .required
                    .iter()
                    .filter(|name| !selected_names.iter().any(|s| s == *name))
                    .map(|name| name.to_string())
                    .collect();
                let extra: Vec<String> = selected_names
                    .iter()
                    .filter(|name| !step.required.contains(&name.as_str()))
                    .cloned()
                    .collect();

                if !missing.is_empty() || !extra.is_empty() {
                    return Err(GameError::WrongSelection { missing, extra }.into());
                }

                self.sessions.clear_selection(player_id);
                progress::set_stage(conn, player_id, step.next)?;
                let view = self.render(conn, player_id, step.next)?;
                Ok(Outcome::screen(view))
            }

            Action::Pick(sku) => {
                let step =
                    script::pick_step(stage).ok_or_else(|| GameError::WrongStage(stage.as_str().to_string()))?;
                let item =
                    catalog::item_by_sku(conn, &sku)?.ok_or_else(|| GameError::UnknownItem(sku.clone()))?;
                if !inventory::has_sku(conn, player_id, &sku)? {
                    return Err(GameError::NotNeeded(item.name).into());
                }
                if !step.accepted.contains(&item.name.as_str()) {
                    return Err(GameError::NotNeeded(item.name).into());
                }
                progress::set_stage(conn, player_id, step.next)?;
                let view = self.render(conn, player_id, step.next)?;
                Ok(Outcome::screen(view))
            }

            Action::Continue => self.advance(conn, player_id, stage, balance),
        }
    }

    /// Покупка: существует → разрешен → еще не куплен → хватает монет.
    /// Списание и запись в инвентарь происходят в одной транзакции.
    fn purchase(
        &self,
        conn: &Connection,
        ctx: &'static ShopContext,
        player_id: i64,
        sku: &str,
        balance: i64,
    ) -> AppResult<Outcome> {
        let item = catalog::item_by_sku(conn, sku)?.ok_or_else(|| GameError::UnknownItem(sku.to_string()))?;
        if !ctx.allowed.contains(&item.name.as_str()) {
            return Err(GameError::ItemLocked(item.name).into());
        }
        if inventory::has_sku(conn, player_id, sku)? {
            return Err(GameError::AlreadyOwned(item.name).into());
        }
        if balance < item.price {
            return Err(GameError::InsufficientFunds {
                price: item.price,
                balance,
            }
            .into());
        }

        // UNIQUE-нарушение здесь уже невозможно без гонки, но add честно
        // сообщает о дубликате и внутри транзакции
        if !inventory::add(conn, player_id, &item)? {
            return Err(GameError::AlreadyOwned(item.name).into());
        }
        let new_balance = balance - item.price;
        progress::set_balance(conn, player_id, new_balance)?;
        log::info!("player {player_id}: bought {} for {} coins", item.sku, item.price);

        let category = self.sessions.current_category(player_id).unwrap_or(item.category);
        let view = shop::category_view(conn, ctx, category, player_id, new_balance)?;
        Ok(Outcome {
            view,
            edit: true,
            notice: Some(format!("✅ Куплено: {}", item.name)),
        })
    }

    /// «Дальше»-переходы повествовательных этапов вместе с их эффектами.
    fn advance(&self, conn: &Connection, player_id: i64, stage: Stage, balance: i64) -> AppResult<Outcome> {
        let next = match stage {
            Stage::WaitingForShopEnter => Stage::WaitingForApproach,
            Stage::WaitingForApproach => Stage::WaitingForOldmanApproach,
            Stage::WaitingForOldmanApproach => Stage::WaitingForShowcase,
            Stage::WaitingForShowcase => Stage::InShopMenu,
            Stage::WaitingForBeltStart => Stage::WaitingForBeltMaterials,
            Stage::WaitingForBeltHardware => Stage::WaitingForBeltTools,
            Stage::WaitingForBeltAssembly => Stage::WaitingForBeltQuality,
            Stage::WaitingForBeltQuality => {
                consume(conn, player_id, script::BELT_CONSUME)?;
                wear_tools(conn, player_id, script::BELT_TOOLS)?;
                Stage::WaitingForBeltSleep
            }
            Stage::WaitingForBeltSleep => Stage::WaitingForShopReturn,
            Stage::WaitingForShopReturn => Stage::WaitingForShopView,
            Stage::WaitingForShopView => Stage::InShopAfterTutorial,
            Stage::WaitingForHolderStart => Stage::WaitingForHolderLeather,
            Stage::WaitingForHolderQuality => {
                consume(conn, player_id, script::HOLDER_CONSUME)?;
                wear_tools(conn, player_id, script::HOLDER_TOOLS)?;
                Stage::WaitingForHolderGift
            }
            Stage::WaitingForHolderGift => {
                progress::set_balance(conn, player_id, balance + economy::HOLDER_GIFT_REWARD)?;
                Stage::WaitingForHolderFinal
            }
            Stage::WaitingForHolderFinal => {
                award(conn, player_id, script::LEFTOVER_BAG_LEATHER)?;
                Stage::WaitingForBagStart
            }
            Stage::WaitingForBagStart => Stage::InShopBagMaterials,
            Stage::WaitingForBagQuality1 => {
                consume(conn, player_id, script::BAG1_CONSUME)?;
                wear_tools(conn, player_id, script::BAG_TOOLS)?;
                progress::set_balance(conn, player_id, balance + economy::PREMIUM_CLIENT_REWARD)?;
                Stage::WaitingForBagRetry
            }
            Stage::WaitingForBagRetry => Stage::InShopBagRetry,
            Stage::WaitingForBagRetryStart => Stage::WaitingForBagRetryMaterials,
            Stage::WaitingForBagQuality2 => {
                consume(conn, player_id, script::BAG2_CONSUME)?;
                wear_tools(conn, player_id, script::BAG_TOOLS)?;
                Stage::WaitingForFinal
            }
            Stage::WaitingForFinal => {
                progress::complete(conn, player_id)?;
                Stage::Completed
            }
            other => return Err(GameError::WrongStage(other.as_str().to_string()).into()),
        };

        if next != Stage::Completed {
            // complete() уже записал терминальный этап
            progress::set_stage(conn, player_id, next)?;
        }

        let mut view = self.render(conn, player_id, next)?;
        if stage == Stage::WaitingForBagQuality2 {
            // 50/50: заказ выходит обычным или отличным
            let quality = if rand::rng().random_bool(0.5) {
                "Отличное"
            } else {
                "Обычное"
            };
            view.text = format!("Качество заказа – {quality}\n\n{}", view.text);
        }
        Ok(Outcome::screen(view))
    }

    fn render(&self, conn: &Connection, player_id: i64, stage: Stage) -> AppResult<StageView> {
        let record = progress::require(conn, player_id)?;
        let selected = self.sessions.selected(player_id);
        script::view(conn, player_id, stage, record.balance, &selected)
    }
}

fn shop_context(stage: Stage) -> Result<&'static ShopContext, GameError> {
    shop::context_for(stage).ok_or_else(|| GameError::WrongStage(stage.as_str().to_string()))
}

fn consume(conn: &Connection, player_id: i64, names: &[&str]) -> AppResult<()> {
    for name in names {
        inventory::remove_by_name(conn, player_id, name)?;
    }
    Ok(())
}

fn wear_tools(conn: &Connection, player_id: i64, names: &[&str]) -> AppResult<()> {
    for name in names {
        inventory::wear(conn, player_id, name, 1)?;
    }
    Ok(())
}

fn award(conn: &Connection, player_id: i64, name: &str) -> AppResult<()> {
    let Some(item) = catalog::item_by_name(conn, name)? else {
        log::warn!("award skipped, item not in catalog: {name}");
        return Ok(());
    };
    // Дубликат не страшен: add вернет false
    inventory::add(conn, player_id, &item)?;
    Ok(())
}
