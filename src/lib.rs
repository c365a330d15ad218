//! «Ремесло» — нарративный Telegram-бот: симулятор кожевенной мастерской.
//!
//! Крейт делится на три слоя:
//! - [`storage`] — SQLite: каталог, инвентарь, персонажи, прогресс;
//! - [`game`] — этапы обучения, магазины и движок переходов;
//! - [`telegram`] — teloxide-обвязка: команды, callback-и, экраны.

pub mod cli;
pub mod core;
pub mod game;
pub mod storage;
pub mod telegram;

pub use core::{AppError, AppResult, GameError};
pub use game::{Action, Engine, Stage};
