//! Cost aggregation, markup, subsidy and tax-relief calculations.
//!
//! All functions here are pure over (configuration, catalogue, margin schedule, organisation
//! settings) and total: a half-filled configuration prices to zero rather than failing. PV-side
//! and storage-side subtotals are kept separate throughout because the subsidy cap applies per
//! category to the *marked-up* cost, so markup has to be apportioned per category before capping.
use crate::catalog::{Catalog, resolve};
use crate::margins::{MarginSchedule, OrgPricingSettings, PricingTier};
use crate::quote::{MountSurface, QuoteConfiguration, TaxReliefTier};
use crate::units::{Dimensionless, Length, Money};
use serde::Serialize;

/// Per-panel mounting price applied when no mounting accessory is selected
pub const DEFAULT_MOUNTING_UNIT_PRICE: Money = Money(120.0);

/// Base labour fee per installation
pub const BASE_LABOUR_FEE: Money = Money(1500.0);

/// Additional labour per panel
pub const PER_PANEL_LABOUR: Money = Money(100.0);

/// Price of the energy management system add-on
pub const ENERGY_MANAGEMENT_PRICE: Money = Money(1500.0);

/// Price of the battery backup (UPS) add-on
pub const BATTERY_BACKUP_PRICE: Money = Money(2500.0);

/// Subsidy ceiling for the PV category
pub const PV_SUBSIDY_CEILING: Money = Money(7000.0);

/// Subsidy ceiling for the storage category
pub const STORAGE_SUBSIDY_CEILING: Money = Money(16000.0);

/// Subsidies may cover at most this share of a category's marked-up cost
pub const SUBSIDY_COST_SHARE: Dimensionless = Dimensionless(0.5);

/// Cost subtotals per component, before any markup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// Panel hardware (unit price times count)
    pub panels: Money,
    /// The inverter (single unit)
    pub inverter: Money,
    /// Storage hardware (unit price times count)
    pub storage: Money,
    /// Mounting accessories, billed per panel
    pub mounting: Money,
    /// Cable trench digging (ground mounts only)
    pub trench: Money,
    /// Installation labour
    pub labour: Money,
    /// Energy management system add-on
    pub energy_management: Money,
    /// Battery backup (UPS) add-on
    pub battery_backup: Money,
}

impl CostBreakdown {
    /// The PV-side category subtotal (everything except storage hardware).
    pub fn pv_total(&self) -> Money {
        self.panels
            + self.inverter
            + self.mounting
            + self.labour
            + self.trench
            + self.energy_management
            + self.battery_backup
    }

    /// The storage-side category subtotal.
    pub fn storage_total(&self) -> Money {
        self.storage
    }

    /// The combined cost of both categories.
    pub fn combined(&self) -> Money {
        self.pv_total() + self.storage_total()
    }
}

/// Aggregate the configuration's component selection into cost subtotals.
///
/// Missing catalogue attributes contribute zero; a panel count of zero zeroes every
/// panel-derived cost including mounting and the per-panel labour term.
pub fn aggregate_costs(
    config: &QuoteConfiguration,
    catalog: &Catalog,
    margins: &MarginSchedule,
) -> CostBreakdown {
    let components = &config.components;
    let panel_count = f64::from(components.panel_count);

    let panel = resolve(catalog, components.panel.as_ref());
    let inverter = resolve(catalog, components.inverter.as_ref());
    let storage = resolve(catalog, components.storage.as_ref());

    let mounting_unit_price = components
        .mounting
        .as_ref()
        .and_then(|id| catalog.get(id))
        .map_or(DEFAULT_MOUNTING_UNIT_PRICE, |item| item.unit_price);

    let trench = if config.installation.surface == MountSurface::Ground {
        let billable =
            (config.installation.trench_length - margins.trench_free_length).max(Length(0.0));
        margins.trench_rate * billable
    } else {
        Money(0.0)
    };

    CostBreakdown {
        panels: panel.unit_price * panel_count,
        inverter: inverter.unit_price,
        storage: storage.unit_price * f64::from(components.storage_count),
        mounting: mounting_unit_price * panel_count,
        trench,
        labour: BASE_LABOUR_FEE + PER_PANEL_LABOUR * panel_count,
        energy_management: if config.installation.energy_management {
            ENERGY_MANAGEMENT_PRICE
        } else {
            Money(0.0)
        },
        battery_backup: if config.installation.battery_backup {
            BATTERY_BACKUP_PRICE
        } else {
            Money(0.0)
        },
    }
}

/// The markup added on top of the cost subtotals.
///
/// The organisation and personal components are retained individually because the subsidy cap
/// needs to know how much markup belongs to each category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkupBreakdown {
    /// Organisation markup on the combined subtotal (elevated tier only)
    pub org: Money,
    /// Salesperson PV margin (zero when no panels are quoted)
    pub personal_pv: Money,
    /// Salesperson storage margin (zero when no storage unit is selected)
    pub personal_storage: Money,
}

impl MarkupBreakdown {
    /// The salesperson's total personal markup.
    pub fn personal(&self) -> Money {
        self.personal_pv + self.personal_storage
    }

    /// The total markup added to the combined cost.
    pub fn total(&self) -> Money {
        self.org + self.personal()
    }
}

/// Compute the markup layer for the given cost subtotals.
pub fn apply_markup(
    costs: &CostBreakdown,
    config: &QuoteConfiguration,
    margins: &MarginSchedule,
    org: &OrgPricingSettings,
) -> MarkupBreakdown {
    let org_markup = if margins.tier == PricingTier::Elevated {
        org.markup
            .map_or(Money(0.0), |markup| markup.applied_to(costs.combined()))
    } else {
        Money(0.0)
    };

    MarkupBreakdown {
        org: org_markup,
        personal_pv: if config.components.panel_count > 0 {
            margins.pv
        } else {
            Money(0.0)
        },
        personal_storage: if config.has_storage() {
            margins.storage
        } else {
            Money(0.0)
        },
    }
}

/// The gross client-facing price: costs plus all markup, before incentives.
pub fn total_system_price(costs: &CostBreakdown, markup: &MarkupBreakdown) -> Money {
    costs.combined() + markup.total()
}

/// Government subsidy amounts per category, each individually capped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubsidyBreakdown {
    /// The PV subsidy amount
    pub pv: Money,
    /// The storage subsidy amount
    pub storage: Money,
    /// Whether the 50% cost cap (rather than the fixed ceiling) bounded the PV subsidy
    pub limited_by_cap_pv: bool,
    /// Whether the 50% cost cap bounded the storage subsidy
    pub limited_by_cap_storage: bool,
}

impl SubsidyBreakdown {
    /// The total subsidy amount.
    pub fn total(&self) -> Money {
        self.pv + self.storage
    }
}

/// Take the lesser of the fixed ceiling and the 50% cost cap, flagging which one bound.
fn capped_subsidy(marked_up_cost: Money, ceiling: Money) -> (Money, bool) {
    let cap = SUBSIDY_COST_SHARE * marked_up_cost;
    if cap < ceiling { (cap, true) } else { (ceiling, false) }
}

/// Compute the subsidy amounts for the customer's elections.
///
/// Subsidies legally cannot exceed half of the *marked-up* category cost, so each category's cap
/// base includes the markup apportioned to it: the PV cap carries the whole organisation markup
/// plus the PV personal margin, the storage cap carries the storage personal margin only. The
/// storage subsidy is gated on a storage unit actually being selected, regardless of the
/// election flag.
pub fn subsidies(
    costs: &CostBreakdown,
    markup: &MarkupBreakdown,
    config: &QuoteConfiguration,
) -> SubsidyBreakdown {
    let mut result = SubsidyBreakdown {
        pv: Money(0.0),
        storage: Money(0.0),
        limited_by_cap_pv: false,
        limited_by_cap_storage: false,
    };

    if config.incentives.pv_subsidy {
        let base = costs.pv_total() + markup.org + markup.personal_pv;
        (result.pv, result.limited_by_cap_pv) = capped_subsidy(base, PV_SUBSIDY_CEILING);
    }

    if config.incentives.storage_subsidy && config.has_storage() {
        let base = costs.storage_total() + markup.personal_storage;
        (result.storage, result.limited_by_cap_storage) =
            capped_subsidy(base, STORAGE_SUBSIDY_CEILING);
    }

    result
}

/// The tax-relief rebate, applied against the full marked-up gross price.
pub fn tax_return(total_system_price: Money, tier: TaxReliefTier) -> Money {
    total_system_price * tier.rate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::fixture::{catalog, elevated_margins, margin_schedule, org_settings, quote_config};
    use crate::margins::Markup;
    use crate::units::MoneyPerLength;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_aggregate_costs_reference_scenario(
        quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
    ) {
        // 10 x 450 PLN panels, 3200 PLN inverter, default 120 PLN/panel mounting,
        // 1500 + 10 x 100 labour, no storage, no trench, no add-ons
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        assert_approx_eq!(Money, costs.panels, Money(4500.0));
        assert_approx_eq!(Money, costs.inverter, Money(3200.0));
        assert_approx_eq!(Money, costs.mounting, Money(1200.0));
        assert_approx_eq!(Money, costs.labour, Money(2500.0));
        assert_approx_eq!(Money, costs.storage, Money(0.0));
        assert_approx_eq!(Money, costs.trench, Money(0.0));
        assert_approx_eq!(Money, costs.pv_total(), Money(11400.0));
        assert_approx_eq!(Money, costs.storage_total(), Money(0.0));
    }

    #[rstest]
    fn test_aggregate_costs_mounting_item(
        mut quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
    ) {
        quote_config.components.mounting = Some("rail".into());
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        assert_approx_eq!(Money, costs.mounting, Money(950.0));

        // An unknown mounting ID falls back to the default per-panel price
        quote_config.components.mounting = Some("no-such-rail".into());
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        assert_approx_eq!(Money, costs.mounting, Money(1200.0));
    }

    #[rstest]
    fn test_aggregate_costs_zero_panels(
        mut quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
    ) {
        quote_config.components.panel_count = 0;
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        assert_approx_eq!(Money, costs.panels, Money(0.0));
        assert_approx_eq!(Money, costs.mounting, Money(0.0));
        // Only the base labour fee remains; the per-panel term is zero
        assert_approx_eq!(Money, costs.labour, BASE_LABOUR_FEE);
    }

    #[rstest]
    fn test_aggregate_costs_add_ons(
        mut quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
    ) {
        quote_config.installation.energy_management = true;
        quote_config.installation.battery_backup = true;
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        assert_approx_eq!(Money, costs.energy_management, ENERGY_MANAGEMENT_PRICE);
        assert_approx_eq!(Money, costs.battery_backup, BATTERY_BACKUP_PRICE);
    }

    #[rstest]
    // 30 m trench with 10 m free at 80 PLN/m
    #[case(MountSurface::Ground, 30.0, 1600.0)]
    // Allowance covers the whole trench
    #[case(MountSurface::Ground, 8.0, 0.0)]
    // Roof mounts never pay for trenching
    #[case(MountSurface::Roof, 30.0, 0.0)]
    fn test_aggregate_costs_trench(
        mut quote_config: QuoteConfiguration,
        catalog: Catalog,
        mut margin_schedule: MarginSchedule,
        #[case] surface: MountSurface,
        #[case] trench_length: f64,
        #[case] expected: f64,
    ) {
        quote_config.installation.surface = surface;
        quote_config.installation.trench_length = Length(trench_length);
        margin_schedule.trench_rate = MoneyPerLength(80.0);
        margin_schedule.trench_free_length = Length(10.0);

        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        assert_approx_eq!(Money, costs.trench, Money(expected));
    }

    #[rstest]
    fn test_apply_markup_standard_tier(
        quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
        org_settings: OrgPricingSettings,
    ) {
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        let markup = apply_markup(&costs, &quote_config, &margin_schedule, &org_settings);
        assert_approx_eq!(Money, markup.org, Money(0.0));
        assert_approx_eq!(Money, markup.personal(), Money(0.0));
    }

    #[rstest]
    fn test_apply_markup_elevated_tier(
        quote_config: QuoteConfiguration,
        catalog: Catalog,
        elevated_margins: MarginSchedule,
        org_settings: OrgPricingSettings,
    ) {
        let costs = aggregate_costs(&quote_config, &catalog, &elevated_margins);
        let markup = apply_markup(&costs, &quote_config, &elevated_margins, &org_settings);
        // 10% of the 11400 combined subtotal
        assert_approx_eq!(Money, markup.org, Money(1140.0));
        // PV margin applies (panels selected), storage margin does not
        assert_approx_eq!(Money, markup.personal_pv, Money(2000.0));
        assert_approx_eq!(Money, markup.personal_storage, Money(0.0));
        assert_approx_eq!(
            Money,
            total_system_price(&costs, &markup),
            Money(11400.0 + 1140.0 + 2000.0)
        );
    }

    #[rstest]
    fn test_apply_markup_fixed_rule(
        mut quote_config: QuoteConfiguration,
        catalog: Catalog,
        mut elevated_margins: MarginSchedule,
    ) {
        let org = OrgPricingSettings {
            markup: Some(Markup::Fixed {
                value: Money(3000.0),
            }),
        };
        quote_config.components.storage = Some("box5".into());
        elevated_margins.storage = Money(1000.0);

        let costs = aggregate_costs(&quote_config, &catalog, &elevated_margins);
        let markup = apply_markup(&costs, &quote_config, &elevated_margins, &org);
        assert_approx_eq!(Money, markup.org, Money(3000.0));
        assert_approx_eq!(Money, markup.personal_storage, Money(1000.0));
    }

    #[rstest]
    fn test_subsidy_cap_binding(
        quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
        org_settings: OrgPricingSettings,
    ) {
        // 50% of 11400 is 5700, below the 7000 ceiling, so the cap binds
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        let markup = apply_markup(&costs, &quote_config, &margin_schedule, &org_settings);
        let result = subsidies(&costs, &markup, &quote_config);
        assert_approx_eq!(Money, result.pv, Money(5700.0));
        assert!(result.limited_by_cap_pv);
        assert_approx_eq!(Money, result.storage, Money(0.0));
    }

    #[rstest]
    fn test_subsidy_ceiling_binding(
        mut quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
        org_settings: OrgPricingSettings,
    ) {
        // A larger system pushes half the PV cost above the 7000 ceiling
        quote_config.components.panel_count = 30;
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        let markup = apply_markup(&costs, &quote_config, &margin_schedule, &org_settings);
        let result = subsidies(&costs, &markup, &quote_config);
        assert_approx_eq!(Money, result.pv, PV_SUBSIDY_CEILING);
        assert!(!result.limited_by_cap_pv);
    }

    #[rstest]
    fn test_subsidy_storage_gating(
        mut quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
        org_settings: OrgPricingSettings,
    ) {
        // Election flag set but no storage unit selected: no storage subsidy
        quote_config.incentives.storage_subsidy = true;
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        let markup = apply_markup(&costs, &quote_config, &margin_schedule, &org_settings);
        let result = subsidies(&costs, &markup, &quote_config);
        assert_approx_eq!(Money, result.storage, Money(0.0));

        // With a unit selected, half of 9000 is 4500, below the 16000 ceiling
        quote_config.components.storage = Some("box5".into());
        let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
        let markup = apply_markup(&costs, &quote_config, &margin_schedule, &org_settings);
        let result = subsidies(&costs, &markup, &quote_config);
        assert_approx_eq!(Money, result.storage, Money(4500.0));
        assert!(result.limited_by_cap_storage);
    }

    #[rstest]
    #[case(TaxReliefTier::None, 0.0)]
    #[case(TaxReliefTier::Reduced, 1368.0)]
    #[case(TaxReliefTier::Standard, 3648.0)]
    fn test_tax_return(#[case] tier: TaxReliefTier, #[case] expected: f64) {
        let result = tax_return(Money(11400.0), tier);
        assert_approx_eq!(Money, result, Money(expected));
    }

    #[rstest]
    fn test_total_price_monotonic_in_panel_count(
        mut quote_config: QuoteConfiguration,
        catalog: Catalog,
        margin_schedule: MarginSchedule,
        org_settings: OrgPricingSettings,
    ) {
        let mut previous = Money(0.0);
        for count in 0..30 {
            quote_config.components.panel_count = count;
            let costs = aggregate_costs(&quote_config, &catalog, &margin_schedule);
            let markup = apply_markup(&costs, &quote_config, &margin_schedule, &org_settings);
            let total = total_system_price(&costs, &markup);
            assert!(total >= previous);
            previous = total;
        }
    }
}
