//! The 20-year return-on-investment projection and the connection-power policy gate.
use crate::quote::EnergyProfile;
use crate::units::{Dimensionless, Energy, EnergyPerPower, Money, MoneyPerEnergy, Power};
use serde::{Deserialize, Serialize};

/// Number of years simulated by the ROI projection
pub const PROJECTION_HORIZON_YEARS: u32 = 20;

/// Flat yearly yield assumption, in kWh per kWp (no geographic or seasonal adjustment)
pub const SPECIFIC_YIELD: EnergyPerPower = EnergyPerPower(1000.0);

/// Assumed yearly growth of the customer's electricity bill
pub const BILL_INFLATION: Dimensionless = Dimensionless(0.08);

/// Share of production the household uses directly, without storage or management
const BASE_SELF_CONSUMPTION: Dimensionless = Dimensionless(0.6);

/// Self-consumption gained by adding a storage unit
const STORAGE_SELF_CONSUMPTION_BONUS: Dimensionless = Dimensionless(0.2);

/// Self-consumption gained by adding an energy management system
const ENERGY_MANAGEMENT_BONUS: Dimensionless = Dimensionless(0.05);

/// The effective per-kWh price for the customer's tariff.
///
/// Dual-rate tariffs blend the peak and off-peak rates by the off-peak share; flat tariffs use
/// the single price directly.
pub fn effective_energy_price(profile: &EnergyProfile) -> MoneyPerEnergy {
    match (profile.tariff.is_dual_rate(), &profile.off_peak) {
        (true, Some(off_peak)) => {
            let peak_share = Dimensionless(1.0) - off_peak.share;
            profile.price * peak_share + off_peak.price * off_peak.share
        }
        _ => profile.price,
    }
}

/// The heuristic share of production the household can actually consume.
///
/// Clamped to [0, 1] so that projected savings can never exceed the production value, whatever
/// bonuses are added in future.
pub fn self_consumption_ratio(has_storage: bool, has_energy_management: bool) -> Dimensionless {
    let mut ratio = BASE_SELF_CONSUMPTION;
    if has_storage {
        ratio += STORAGE_SELF_CONSUMPTION_BONUS;
    }
    if has_energy_management {
        ratio += ENERGY_MANAGEMENT_BONUS;
    }

    ratio.clamp(0.0, 1.0)
}

/// One simulated year of the projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearPoint {
    /// Year number, starting at 1
    pub year: u32,
    /// Avoided electricity cost in this year
    pub savings: Money,
    /// Cumulative balance at the end of this year (starts at minus the net investment)
    pub balance: Money,
}

/// The year-by-year ROI projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiProjection {
    /// One point per simulated year
    pub chart: Vec<YearPoint>,
    /// First year at which the cumulative balance becomes non-negative, if within the horizon
    pub payback_year: Option<u32>,
}

/// Simulate the energy-bill offset against the net investment over the projection horizon.
///
/// Each year's savings are the lesser of the (inflating) bill estimate and the value of the
/// self-consumed production, which is constant under the flat yield assumption.
pub fn project_savings(
    net_investment: Money,
    profile: &EnergyProfile,
    system_power: Power,
    has_storage: bool,
    has_energy_management: bool,
) -> RoiProjection {
    let price = effective_energy_price(profile);
    let ratio = self_consumption_ratio(has_storage, has_energy_management);
    let production: Energy = SPECIFIC_YIELD * system_power;
    let usable_production_value = production * price * ratio;

    let mut bill_estimate = profile.yearly_consumption * price;
    let mut balance = Money(0.0) - net_investment;
    let mut payback_year = None;
    let mut chart = Vec::new();

    for year in 1..=PROJECTION_HORIZON_YEARS {
        let savings = bill_estimate.min(usable_production_value);
        balance += savings;
        if payback_year.is_none() && balance >= Money(0.0) {
            payback_year = Some(year);
        }
        chart.push(YearPoint {
            year,
            savings,
            balance,
        });

        bill_estimate = bill_estimate * (Dimensionless(1.0) + BILL_INFLATION);
    }

    RoiProjection {
        chart,
        payback_year,
    }
}

/// The result of checking the system against the grid connection limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerCheck {
    /// The power figure compared against the limit
    pub power: Power,
    /// The grid connection power limit
    pub limit: Power,
    /// Whether the limit is exceeded
    pub exceeds: bool,
}

/// Check the system against the grid connection power limit.
///
/// The grid sees at most the larger of the array size and the inverter rating, so the check uses
/// `max` of the two. Exceeding the limit is a policy gate, not an error: the wizard refuses to
/// progress until the user acknowledges the risk.
pub fn check_connection_power(system_power: Power, inverter_power: Power, limit: Power) -> PowerCheck {
    let power = system_power.max(inverter_power);
    PowerCheck {
        power,
        limit,
        exceeds: power > limit,
    }
}
