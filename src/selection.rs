//! The component auto-selection heuristic.
//!
//! Given the customer's consumption profile, this picks a default panel/inverter/storage
//! combination sized with a 20% margin over consumption. The result is a recommendation, not an
//! optimisation: the panel and storage unit are simply the first available in catalogue order,
//! and the user may override every field afterwards.
use crate::catalog::{Catalog, CatalogItem, ItemCategory, ItemID, items_in_category};
use crate::projection::SPECIFIC_YIELD;
use crate::quote::QuoteConfiguration;
use crate::units::{Dimensionless, Energy, Power};
use std::cmp::Ordering;

/// Oversizing applied to the consumption-derived array size
const OVERSIZING: Dimensionless = Dimensionless(1.2);

/// Storage-to-array sizing ratio for dual-rate tariffs, where storing day-generated energy
/// against expensive evening rates pays off
const DUAL_RATE_STORAGE_RATIO: f64 = 1.1;

/// Storage-to-array sizing ratio for flat tariffs
const FLAT_RATE_STORAGE_RATIO: f64 = 0.7;

/// A recommended component selection, to be applied to the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPatch {
    /// The recommended panel model
    pub panel: Option<ItemID>,
    /// The recommended panel count
    pub panel_count: u32,
    /// The recommended inverter model
    pub inverter: Option<ItemID>,
    /// The recommended storage unit model
    pub storage: Option<ItemID>,
    /// The recommended storage unit count
    pub storage_count: u32,
}

impl SelectionPatch {
    /// Apply the recommendation to a configuration.
    ///
    /// Resets the connection-power risk acknowledgment: a new selection must be re-acknowledged.
    pub fn apply_to(&self, config: &mut QuoteConfiguration) {
        config.components.panel = self.panel.clone();
        config.components.panel_count = self.panel_count;
        config.components.inverter = self.inverter.clone();
        config.components.storage = self.storage.clone();
        config.components.storage_count = self.storage_count;
        config.power_risk_acknowledged = false;
    }
}

/// The array size required to cover the given yearly consumption, with the oversizing margin.
pub fn required_array_power(yearly_consumption: Energy) -> Power {
    yearly_consumption / SPECIFIC_YIELD * OVERSIZING
}

/// Whether an inverter suits the connection's phase count.
///
/// Single-phase connections take single-phase units only; three-phase connections take
/// three-phase or phase-agnostic units.
fn inverter_compatible(item: &CatalogItem, phases: u8) -> bool {
    match (phases, item.phases) {
        (1, Some(1)) => true,
        (1, _) => false,
        (_, Some(3) | None) => true,
        _ => false,
    }
}

/// Recommend a component selection for the configuration's consumption profile.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn auto_select(config: &QuoteConfiguration, catalog: &Catalog) -> SelectionPatch {
    let required = required_array_power(config.energy.yearly_consumption);

    let panel = items_in_category(catalog, ItemCategory::Panel).next();
    let panel_count = panel
        .and_then(|item| item.power)
        .filter(|power| power.value() > 0.0)
        .map_or(0, |power| (required / power).value().ceil() as u32);

    let inverter = items_in_category(catalog, ItemCategory::Inverter)
        .filter(|item| inverter_compatible(item, config.energy.phases))
        .min_by(|a, b| {
            let distance = |item: &CatalogItem| {
                (item.power.unwrap_or(Power(0.0)) - required).value().abs()
            };
            distance(a)
                .partial_cmp(&distance(b))
                .unwrap_or(Ordering::Equal)
        });

    let ratio = if config.energy.tariff.is_dual_rate() {
        DUAL_RATE_STORAGE_RATIO
    } else {
        FLAT_RATE_STORAGE_RATIO
    };
    let target_capacity = Energy(required.value() * ratio);
    let storage = items_in_category(catalog, ItemCategory::Storage).next();
    let storage_count = storage
        .and_then(|item| item.capacity)
        .filter(|capacity| capacity.value() > 0.0)
        .map_or(1, |capacity| {
            ((target_capacity / capacity).value().round() as u32).max(1)
        });

    SelectionPatch {
        panel: panel.map(|item| item.id.clone()),
        panel_count,
        inverter: inverter.map(|item| item.id.clone()),
        storage: storage.map(|item| item.id.clone()),
        storage_count,
    }
}
