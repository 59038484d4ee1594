//! Salesperson margin settings and the organisation-wide pricing rule.
//!
//! Personal margins are flat PLN amounts added per offer scope; the organisation markup is a
//! single rule (percentage or fixed) that only applies to salespeople in the elevated pricing
//! tier. Both files are optional in a quote directory; defaults are all-zero.
use crate::input::read_toml;
use crate::units::{Length, Money, MoneyPerLength};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const MARGINS_FILE_NAME: &str = "margins.toml";
const ORG_FILE_NAME: &str = "org.toml";

/// Salesperson classification for organisation-level markup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum PricingTier {
    /// Regular pricing; the organisation markup does not apply
    #[string = "standard"]
    Standard,
    /// Higher pricing; the organisation markup is added on top of costs
    #[string = "elevated"]
    Elevated,
}

/// Per-salesperson fixed margins and trench cost schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarginSchedule {
    /// The salesperson's pricing tier
    pub tier: PricingTier,
    /// Fixed margin for a PV installation
    pub pv: Money,
    /// Fixed margin for a storage installation
    pub storage: Money,
    /// Fixed margin for a combined PV + heating installation. Parsed from the salesperson's
    /// schedule but not yet read by the pricing engine: reserved for the heating offer variants.
    pub hybrid: Money,
    /// Fixed margin for a heating installation. Reserved for the heating offer variants, like
    /// `hybrid`.
    pub heating: Money,
    /// Price per metre of cable trench
    pub trench_rate: MoneyPerLength,
    /// Trench length included free of charge
    pub trench_free_length: Length,
}

impl Default for MarginSchedule {
    fn default() -> Self {
        Self {
            tier: PricingTier::Standard,
            pv: Money(0.0),
            storage: Money(0.0),
            hybrid: Money(0.0),
            heating: Money(0.0),
            trench_rate: MoneyPerLength(0.0),
            trench_free_length: Length(0.0),
        }
    }
}

impl MarginSchedule {
    /// Read the margin schedule from `margins.toml` in the given quote directory.
    ///
    /// A missing file yields the all-zero default schedule.
    pub fn from_path(quote_dir: &Path) -> Result<MarginSchedule> {
        let file_path = quote_dir.join(MARGINS_FILE_NAME);
        if !file_path.is_file() {
            return Ok(MarginSchedule::default());
        }

        read_toml(&file_path)
    }
}

/// The organisation markup rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Markup {
    /// A percentage of the combined cost subtotal
    Percentage {
        /// The markup, in percent
        value: f64,
    },
    /// A flat amount
    Fixed {
        /// The markup amount
        value: Money,
    },
}

impl Markup {
    /// The markup amount for a given cost base.
    pub fn applied_to(&self, base: Money) -> Money {
        match *self {
            Markup::Percentage { value } => base * (value / 100.0),
            Markup::Fixed { value } => value,
        }
    }
}

/// Organisation-wide pricing settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct OrgPricingSettings {
    /// The markup applied for elevated-tier salespeople, if configured
    pub markup: Option<Markup>,
}

impl OrgPricingSettings {
    /// Read the organisation settings from `org.toml` in the given quote directory.
    ///
    /// A missing file yields settings with no markup rule.
    pub fn from_path(quote_dir: &Path) -> Result<OrgPricingSettings> {
        let file_path = quote_dir.join(ORG_FILE_NAME);
        if !file_path.is_file() {
            return Ok(OrgPricingSettings::default());
        }

        read_toml(&file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    #[rstest]
    #[case(Markup::Percentage { value: 10.0 }, 1000.0, 100.0)]
    #[case(Markup::Percentage { value: 0.0 }, 1000.0, 0.0)]
    #[case(Markup::Fixed { value: Money(2500.0) }, 1000.0, 2500.0)]
    fn test_markup_applied_to(#[case] markup: Markup, #[case] base: f64, #[case] expected: f64) {
        assert_approx_eq!(Money, markup.applied_to(Money(base)), Money(expected));
    }

    #[test]
    fn test_margins_from_path_no_file() {
        let dir = tempdir().unwrap();
        assert_eq!(
            MarginSchedule::from_path(dir.path()).unwrap(),
            MarginSchedule::default()
        );
    }

    #[test]
    fn test_margins_from_path() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MARGINS_FILE_NAME),
            "tier = \"elevated\"\npv = 2000.0\ntrench_rate = 80.0\ntrench_free_length = 10.0\n",
        )
        .unwrap();

        let margins = MarginSchedule::from_path(dir.path()).unwrap();
        assert_eq!(margins.tier, PricingTier::Elevated);
        assert_eq!(margins.pv, Money(2000.0));
        assert_eq!(margins.storage, Money(0.0));
        assert_eq!(margins.trench_rate, MoneyPerLength(80.0));
        assert_eq!(margins.trench_free_length, Length(10.0));
    }

    #[test]
    fn test_org_from_path() {
        let dir = tempdir().unwrap();
        assert_eq!(
            OrgPricingSettings::from_path(dir.path()).unwrap(),
            OrgPricingSettings::default()
        );

        fs::write(
            dir.path().join(ORG_FILE_NAME),
            "[markup]\nkind = \"percentage\"\nvalue = 5.0\n",
        )
        .unwrap();
        let org = OrgPricingSettings::from_path(dir.path()).unwrap();
        assert_eq!(org.markup, Some(Markup::Percentage { value: 5.0 }));
    }
}
