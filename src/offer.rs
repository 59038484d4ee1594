//! Offer computation and freezing.
//!
//! [`compute_offer`] is the single entry point the wizard calls after every configuration
//! change. It re-derives the complete [`FinancialResult`] from scratch; nothing is carried over
//! from a previous call, so it is safe to invoke repeatedly and discard results while the user
//! is still typing. A result is never persisted — only the frozen [`Offer`] snapshot is, and the
//! result is re-derived from its `calculator_state` when the offer is reopened.
use crate::catalog::{Catalog, resolve};
use crate::id::define_id_type;
use crate::margins::{MarginSchedule, OrgPricingSettings};
use crate::pricing::{
    CostBreakdown, MarkupBreakdown, SubsidyBreakdown, aggregate_costs, apply_markup, subsidies,
    tax_return, total_system_price,
};
use crate::projection::{PowerCheck, RoiProjection, check_connection_power, project_savings};
use crate::quote::QuoteConfiguration;
use crate::units::{Energy, Money, Power};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

define_id_type!(OfferID);

/// All financial outputs derived from one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialResult {
    /// Gross client-facing price after all markup, before incentives
    pub total_system_price: Money,
    /// Per-component cost subtotals
    pub costs: CostBreakdown,
    /// Organisation and personal markup components
    pub markup: MarkupBreakdown,
    /// Subsidy amounts, individually capped
    pub subsidies: SubsidyBreakdown,
    /// Tax-relief rebate off the gross price
    pub tax_return: Money,
    /// `total_system_price - tax_return - total subsidies`; may be negative if incentives
    /// exceed the price
    pub net_investment: Money,
    /// Rated DC power of the quoted array
    pub system_power: Power,
    /// The connection-power policy gate
    pub power_check: PowerCheck,
    /// The 20-year ROI projection against the net investment
    pub projection: RoiProjection,
}

/// Derive the complete financial result for a configuration.
///
/// Pure and total: called with a half-filled configuration it produces degenerate but defined
/// outputs (zero prices, no payback) rather than failing.
pub fn compute_offer(
    config: &QuoteConfiguration,
    catalog: &Catalog,
    margins: &MarginSchedule,
    org: &OrgPricingSettings,
) -> FinancialResult {
    let panel = resolve(catalog, config.components.panel.as_ref());
    let inverter = resolve(catalog, config.components.inverter.as_ref());

    let costs = aggregate_costs(config, catalog, margins);
    let markup = apply_markup(&costs, config, margins, org);
    let total = total_system_price(&costs, &markup);
    let subsidies = subsidies(&costs, &markup, config);
    let tax_return = tax_return(total, config.incentives.tax_relief);
    let net_investment = total - tax_return - subsidies.total();

    let system_power = panel.power * f64::from(config.components.panel_count);
    let power_check =
        check_connection_power(system_power, inverter.power, config.energy.connection_power);
    let projection = project_savings(
        net_investment,
        &config.energy,
        system_power,
        config.has_storage(),
        config.installation.energy_management,
    );

    FinancialResult {
        total_system_price: total,
        costs,
        markup,
        subsidies,
        tax_return,
        net_investment,
        system_power,
        power_check,
        projection,
    }
}

/// Resolved component summary, populated for the downstream installation-creation process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentSummary {
    /// Panel model name (empty when none selected)
    pub panel_model: String,
    /// Number of panels
    pub panel_count: u32,
    /// Inverter model name
    pub inverter_model: String,
    /// Storage unit model name
    pub storage_model: String,
    /// Number of storage units
    pub storage_count: u32,
    /// Rated DC power of the array
    pub system_power: Power,
    /// Total storage capacity
    pub storage_capacity: Energy,
}

/// An immutable snapshot of a finished quote, handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    /// A unique identifier for the offer
    pub id: OfferID,
    /// Display name of the offer
    pub name: String,
    /// Date the offer was frozen (supplied by the caller; the engine uses no wall clock)
    pub date_created: NaiveDate,
    /// The gross client-facing price
    pub final_price: Money,
    /// The organisation markup included in the price
    pub applied_markup: Money,
    /// The salesperson markup included in the price
    pub personal_markup: Money,
    /// Resolved component summary for installation creation
    pub components: ComponentSummary,
    /// The full configuration snapshot, for re-deriving the financials when editing
    pub calculator_state: QuoteConfiguration,
}

impl Offer {
    /// Freeze a computed result into an immutable offer record.
    pub fn freeze(
        id: OfferID,
        name: &str,
        date_created: NaiveDate,
        config: &QuoteConfiguration,
        catalog: &Catalog,
        result: &FinancialResult,
    ) -> Offer {
        let panel = resolve(catalog, config.components.panel.as_ref());
        let inverter = resolve(catalog, config.components.inverter.as_ref());
        let storage = resolve(catalog, config.components.storage.as_ref());
        let storage_count = if config.has_storage() {
            config.components.storage_count
        } else {
            0
        };

        Offer {
            id,
            name: name.to_string(),
            date_created,
            final_price: result.total_system_price,
            applied_markup: result.markup.org,
            personal_markup: result.markup.personal(),
            components: ComponentSummary {
                panel_model: panel.name,
                panel_count: config.components.panel_count,
                inverter_model: inverter.name,
                storage_model: storage.name,
                storage_count,
                system_power: result.system_power,
                storage_capacity: storage.capacity * f64::from(storage_count),
            },
            calculator_state: config.clone(),
        }
    }
}
