//! Fixtures for tests

use crate::catalog::{Catalog, CatalogItem, ItemCategory};
use crate::margins::{MarginSchedule, Markup, OrgPricingSettings, PricingTier};
use crate::quote::{
    ComponentSelection, CustomerRef, EnergyProfile, IncentiveElections, InstallationParams,
    MountSurface, Orientation, QuoteConfiguration, Tariff, TaxReliefTier,
};
use crate::units::{Energy, Length, Money, MoneyPerEnergy, MoneyPerLength, Power};
use rstest::fixture;

/// A small but representative inventory.
#[fixture]
pub fn catalog() -> Catalog {
    let items = [
        CatalogItem {
            id: "panel450".into(),
            name: "Astro 450W".into(),
            category: ItemCategory::Panel,
            unit_price: Money(450.0),
            power: Some(Power(0.45)),
            capacity: None,
            phases: None,
        },
        CatalogItem {
            id: "panel410".into(),
            name: "Astro 410W Black".into(),
            category: ItemCategory::Panel,
            unit_price: Money(520.0),
            power: Some(Power(0.41)),
            capacity: None,
            phases: None,
        },
        CatalogItem {
            id: "inv5".into(),
            name: "SolarMax 5K".into(),
            category: ItemCategory::Inverter,
            unit_price: Money(3200.0),
            power: Some(Power(5.0)),
            capacity: None,
            phases: Some(3),
        },
        CatalogItem {
            id: "inv3".into(),
            name: "SolarMax 3K-1".into(),
            category: ItemCategory::Inverter,
            unit_price: Money(2800.0),
            power: Some(Power(3.0)),
            capacity: None,
            phases: Some(1),
        },
        CatalogItem {
            id: "inv8".into(),
            name: "SolarMax 8K".into(),
            category: ItemCategory::Inverter,
            unit_price: Money(5200.0),
            power: Some(Power(8.0)),
            capacity: None,
            phases: None,
        },
        CatalogItem {
            id: "box5".into(),
            name: "PowerBox 5".into(),
            category: ItemCategory::Storage,
            unit_price: Money(9000.0),
            power: None,
            capacity: Some(Energy(5.0)),
            phases: None,
        },
        CatalogItem {
            id: "rail".into(),
            name: "AluRail 35".into(),
            category: ItemCategory::Mounting,
            unit_price: Money(95.0),
            power: None,
            capacity: None,
            phases: None,
        },
    ];

    items.into_iter().map(|item| (item.id.clone(), item)).collect()
}

/// A 4000 kWh/yr flat-tariff household quoting 10 x 450 W panels and a 5 kW inverter.
#[fixture]
pub fn quote_config() -> QuoteConfiguration {
    QuoteConfiguration {
        power_risk_acknowledged: false,
        customer: CustomerRef::Draft {
            name: "Jan Kowalski".into(),
            email: None,
            phone: None,
        },
        energy: EnergyProfile {
            tariff: Tariff::G11,
            yearly_consumption: Energy(4000.0),
            connection_power: Power(7.0),
            phases: 3,
            price: MoneyPerEnergy(1.15),
            off_peak: None,
        },
        components: ComponentSelection {
            panel: Some("panel450".into()),
            panel_count: 10,
            inverter: Some("inv5".into()),
            storage: None,
            storage_count: 1,
            mounting: None,
        },
        installation: InstallationParams {
            surface: MountSurface::Roof,
            roof_slope: Some(35.0),
            roof_material: None,
            orientation: Orientation::South,
            trench_length: Length(0.0),
            energy_management: false,
            battery_backup: false,
        },
        incentives: IncentiveElections {
            pv_subsidy: true,
            storage_subsidy: false,
            tax_relief: TaxReliefTier::None,
        },
    }
}

/// The all-zero default margin schedule.
#[fixture]
pub fn margin_schedule() -> MarginSchedule {
    MarginSchedule::default()
}

/// An elevated-tier salesperson with non-zero margins and a trench schedule.
#[fixture]
pub fn elevated_margins() -> MarginSchedule {
    MarginSchedule {
        tier: PricingTier::Elevated,
        pv: Money(2000.0),
        storage: Money(1000.0),
        hybrid: Money(2500.0),
        heating: Money(1800.0),
        trench_rate: MoneyPerLength(80.0),
        trench_free_length: Length(10.0),
    }
}

/// Organisation settings with a 10% markup rule.
#[fixture]
pub fn org_settings() -> OrgPricingSettings {
    OrgPricingSettings {
        markup: Some(Markup::Percentage { value: 10.0 }),
    }
}
