//! Закрытое перечисление этапов обучения.
//!
//! Сериализованные имена совпадают со строками, под которыми этапы
//! исторически хранятся в `tutorial_progress.current_stage`. Имя этапа
//! фиксирует последнее выполненное действие; экран этапа — то, что игрок
//! увидел сразу после него, поэтому resume — чистая функция от имени.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    // Вводная часть и учебный магазин
    WaitingForShopEnter,
    WaitingForApproach,
    WaitingForOldmanApproach,
    WaitingForShowcase,
    InShopMenu,

    // Ремень
    WaitingForBeltStart,
    WaitingForBeltMaterials,
    WaitingForBeltLeather,
    WaitingForBeltHardware,
    WaitingForBeltTools,
    WaitingForBeltAssembly,
    WaitingForBeltQuality,
    WaitingForBeltSleep,

    // Возвращение в магазин и картхолдер
    WaitingForShopReturn,
    WaitingForShopView,
    InShopAfterTutorial,
    WaitingForHolderStart,
    WaitingForHolderLeather,
    WaitingForHolderTools,
    WaitingForHolderThreads,
    WaitingForHolderQuality,
    WaitingForHolderGift,
    WaitingForHolderFinal,

    // Сумка, первая попытка
    WaitingForBagStart,
    InShopBagMaterials,
    WaitingForBagMaterialsSelection,
    WaitingForBagToolsSelection,
    WaitingForBagWaxSelection,
    WaitingForBagThreadsSelection,
    #[strum(serialize = "waiting_for_bag_quality_1")]
    WaitingForBagQuality1,

    // Сумка, вторая попытка
    WaitingForBagRetry,
    InShopBagRetry,
    WaitingForBagRetryStart,
    WaitingForBagRetryMaterials,
    WaitingForBagRetryTools,
    WaitingForBagRetryWax,
    WaitingForBagRetryThreads,
    #[strum(serialize = "waiting_for_bag_quality_2")]
    WaitingForBagQuality2,

    // Финал
    WaitingForFinal,
    Completed,
}

impl Stage {
    /// Начальный этап обучения.
    pub fn entry() -> Self {
        Self::WaitingForShopEnter
    }

    /// Каноничное строковое имя этапа.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Этапы, на которых открыт один из четырех магазинов.
    pub fn is_shop(&self) -> bool {
        matches!(
            self,
            Self::InShopMenu | Self::InShopAfterTutorial | Self::InShopBagMaterials | Self::InShopBagRetry
        )
    }

    /// Этапы с мульти-выбором (инструменты / материалы).
    pub fn is_multi_select(&self) -> bool {
        matches!(
            self,
            Self::WaitingForBeltTools
                | Self::WaitingForHolderTools
                | Self::WaitingForBagMaterialsSelection
                | Self::WaitingForBagToolsSelection
                | Self::WaitingForBagRetryMaterials
                | Self::WaitingForBagRetryTools
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn every_stage_round_trips_through_its_name() {
        for stage in Stage::iter() {
            let name = stage.as_str();
            let parsed: Stage = name.parse().unwrap();
            assert_eq!(parsed, stage, "round trip failed for {name}");
        }
    }

    #[test]
    fn legacy_names_are_preserved() {
        assert_eq!(Stage::WaitingForShopEnter.as_str(), "waiting_for_shop_enter");
        assert_eq!(Stage::InShopAfterTutorial.as_str(), "in_shop_after_tutorial");
        assert_eq!(Stage::WaitingForBagQuality1.as_str(), "waiting_for_bag_quality_1");
        assert_eq!(Stage::WaitingForBagQuality2.as_str(), "waiting_for_bag_quality_2");
        assert_eq!(Stage::WaitingForBagRetryStart.as_str(), "waiting_for_bag_retry_start");
    }

    #[test]
    fn unknown_name_does_not_parse() {
        assert!("waiting_for_dragon".parse::<Stage>().is_err());
    }

    #[test]
    fn stage_count_matches_script() {
        assert_eq!(Stage::iter().count(), 40);
    }
}
