//! Игровая логика обучения: этапы, действия, магазины и движок переходов.

pub mod action;
pub mod engine;
pub mod script;
pub mod session;
pub mod shop;
pub mod stage;
pub mod view;

pub use action::Action;
pub use engine::{Engine, Outcome};
pub use stage::Stage;
pub use view::{Button, StageView};
