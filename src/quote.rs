//! The quote configuration: everything a wizard session knows about one prospective offer.
//!
//! A `QuoteConfiguration` is created fresh per session (or hydrated from a saved offer when
//! editing) and mutated field by field as the user advances through the wizard steps. The pricing
//! engine never mutates it; every financial output is re-derived from the full configuration on
//! each call.
use crate::id::define_id_type;
use crate::input::{deserialise_proportion, read_toml};
use crate::units::{Dimensionless, Energy, Length, MoneyPerEnergy, Power};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const QUOTE_FILE_NAME: &str = "quote.toml";

define_id_type!(CustomerID);
pub use crate::catalog::ItemID;

/// A reference to the customer the quote is for.
///
/// Either an existing customer record or a draft captured during the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CustomerRef {
    /// An existing customer, referenced by ID
    Existing {
        /// The customer record ID
        id: CustomerID,
    },
    /// A new customer drafted in the wizard
    Draft {
        /// The customer's name
        name: String,
        /// Contact email, if captured
        #[serde(default)]
        email: Option<String>,
        /// Contact phone number, if captured
        #[serde(default)]
        phone: Option<String>,
    },
}

/// Polish electricity billing schedule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum Tariff {
    /// Flat single-rate tariff
    #[string = "G11"]
    G11,
    /// Dual-rate day/night tariff
    #[string = "G12"]
    G12,
    /// Dual-rate tariff with cheap weekends
    #[string = "G12W"]
    G12W,
}

impl Tariff {
    /// Whether the tariff has distinct peak and off-peak prices.
    pub fn is_dual_rate(&self) -> bool {
        matches!(self, Tariff::G12 | Tariff::G12W)
    }
}

/// The off-peak leg of a dual-rate tariff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OffPeak {
    /// Off-peak price per kWh
    pub price: MoneyPerEnergy,
    /// Share of yearly consumption billed at the off-peak rate
    #[serde(deserialize_with = "deserialise_proportion")]
    pub share: Dimensionless,
}

/// The customer's consumption profile and grid connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyProfile {
    /// The billing tariff
    pub tariff: Tariff,
    /// Yearly consumption in kWh
    pub yearly_consumption: Energy,
    /// The grid connection power limit in kW
    pub connection_power: Power,
    /// Number of phases of the grid connection (1 or 3)
    #[serde(default = "default_phases")]
    pub phases: u8,
    /// Price per kWh (the peak rate for dual-rate tariffs)
    pub price: MoneyPerEnergy,
    /// Off-peak rate and split, required for dual-rate tariffs
    #[serde(default)]
    pub off_peak: Option<OffPeak>,
}

fn default_phases() -> u8 {
    3
}

/// The hardware selected for the installation.
///
/// All references are optional: a configuration mid-edit may reference nothing yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentSelection {
    /// The selected PV panel model
    pub panel: Option<ItemID>,
    /// Number of panels
    #[serde(default)]
    pub panel_count: u32,
    /// The selected inverter model
    pub inverter: Option<ItemID>,
    /// The selected storage unit model, if any
    pub storage: Option<ItemID>,
    /// Number of storage units
    #[serde(default = "default_storage_count")]
    pub storage_count: u32,
    /// The mounting accessory; a default per-panel price applies when unset
    pub mounting: Option<ItemID>,
}

fn default_storage_count() -> u32 {
    1
}

/// Where the array is mounted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum MountSurface {
    /// On the building's roof
    #[string = "roof"]
    Roof,
    /// Ground-mounted, with a cable trench to the building
    #[string = "ground"]
    Ground,
}

/// Roof covering material, relevant for roof mounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum RoofMaterial {
    /// Ceramic or concrete tile
    #[string = "tile"]
    Tile,
    /// Metal sheet or trapezoidal panel
    #[string = "metal"]
    Metal,
    /// Flat roof (membrane or felt)
    #[string = "flat"]
    Flat,
}

/// Compass orientation of the array.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum Orientation {
    /// Due south
    #[string = "south"]
    South,
    /// South-east
    #[string = "south-east"]
    SouthEast,
    /// South-west
    #[string = "south-west"]
    SouthWest,
    /// Due east
    #[string = "east"]
    East,
    /// Due west
    #[string = "west"]
    West,
    /// Split array facing east and west
    #[string = "east-west"]
    EastWest,
}

/// Physical installation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallationParams {
    /// The mount surface
    pub surface: MountSurface,
    /// Roof slope in degrees (roof mounts)
    #[serde(default)]
    pub roof_slope: Option<f64>,
    /// Roof material (roof mounts)
    #[serde(default)]
    pub roof_material: Option<RoofMaterial>,
    /// Array orientation
    #[serde(default = "default_orientation")]
    pub orientation: Orientation,
    /// Cable trench length in metres (ground mounts)
    #[serde(default = "Length::default_zero")]
    pub trench_length: Length,
    /// Whether an energy management system is included
    #[serde(default)]
    pub energy_management: bool,
    /// Whether a battery backup (UPS) module is included
    #[serde(default)]
    pub battery_backup: bool,
}

fn default_orientation() -> Orientation {
    Orientation::South
}

impl Length {
    fn default_zero() -> Self {
        Length(0.0)
    }
}

/// Government tax-relief tier elected by the customer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum TaxReliefTier {
    /// No tax relief
    #[string = "none"]
    None,
    /// The 12% income tax band
    #[string = "12"]
    Reduced,
    /// The 32% income tax band
    #[string = "32"]
    Standard,
}

impl TaxReliefTier {
    /// The rebate rate for this tier, as a fraction of the gross price.
    pub fn rate(&self) -> Dimensionless {
        match self {
            TaxReliefTier::None => Dimensionless(0.0),
            TaxReliefTier::Reduced => Dimensionless(0.12),
            TaxReliefTier::Standard => Dimensionless(0.32),
        }
    }
}

/// The customer's incentive elections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncentiveElections {
    /// Whether the PV subsidy is applied for
    #[serde(default)]
    pub pv_subsidy: bool,
    /// Whether the storage subsidy is applied for (requires a storage unit)
    #[serde(default)]
    pub storage_subsidy: bool,
    /// The elected tax-relief tier
    #[serde(default = "default_tax_relief")]
    pub tax_relief: TaxReliefTier,
}

fn default_tax_relief() -> TaxReliefTier {
    TaxReliefTier::None
}

/// The full configuration of one quote, owned by the wizard session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteConfiguration {
    /// Whether the user has acknowledged exceeding the connection power limit.
    ///
    /// Reset whenever the component selection is replaced by the auto-selection heuristic.
    /// Listed before the sub-tables so the configuration serialises to valid TOML.
    #[serde(default)]
    pub power_risk_acknowledged: bool,
    /// The customer the quote is for
    pub customer: CustomerRef,
    /// Consumption profile and grid connection
    pub energy: EnergyProfile,
    /// Selected hardware
    #[serde(default)]
    pub components: ComponentSelection,
    /// Installation parameters
    pub installation: InstallationParams,
    /// Incentive elections
    pub incentives: IncentiveElections,
}

impl QuoteConfiguration {
    /// Read a quote configuration from the `quote.toml` file in the given directory.
    pub fn from_path(quote_dir: &Path) -> Result<QuoteConfiguration> {
        let config: QuoteConfiguration = read_toml(&quote_dir.join(QUOTE_FILE_NAME))?;
        config
            .validate()
            .with_context(|| format!("Invalid quote configuration in {}", quote_dir.display()))?;

        Ok(config)
    }

    /// Check the configuration's invariants.
    ///
    /// Negative quantities and inconsistent elections are rejected here, at the input boundary;
    /// the pricing engine itself assumes validated input and never fails.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            matches!(self.energy.phases, 1 | 3),
            "Connection phases must be 1 or 3"
        );
        ensure!(
            self.energy.yearly_consumption >= Energy(0.0),
            "Yearly consumption cannot be negative"
        );
        ensure!(
            self.energy.connection_power >= Power(0.0),
            "Connection power cannot be negative"
        );
        ensure!(
            self.energy.price >= MoneyPerEnergy(0.0),
            "Energy price cannot be negative"
        );
        if self.energy.tariff.is_dual_rate() {
            ensure!(
                self.energy.off_peak.is_some(),
                "Dual-rate tariff requires an off-peak price and share"
            );
        }
        if let Some(off_peak) = &self.energy.off_peak {
            ensure!(
                off_peak.price >= MoneyPerEnergy(0.0),
                "Off-peak price cannot be negative"
            );
        }
        ensure!(
            self.installation.trench_length >= Length(0.0),
            "Trench length cannot be negative"
        );
        if self.components.storage.is_some() {
            ensure!(
                self.components.storage_count >= 1,
                "Storage unit count must be at least 1 when a storage unit is selected"
            );
        }
        if self.incentives.storage_subsidy {
            ensure!(
                self.components.storage.is_some(),
                "Storage subsidy requires a storage unit to be selected"
            );
        }

        Ok(())
    }

    /// Whether a storage unit is part of the selection.
    pub fn has_storage(&self) -> bool {
        self.components.storage.is_some()
    }
}
