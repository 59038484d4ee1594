#![allow(missing_docs)]

//! This module defines the unit types used by the pricing engine and their conversions.
//!
//! Prices are in PLN, energy in kWh, power in kW (kWp for DC array capacity) and lengths in
//! metres. Keeping these as separate newtypes stops a consumption figure from being added to a
//! price by accident; the multiplication/division rules below define the conversions that are
//! actually meaningful.

use serde::{Deserialize, Serialize};

/// Represents a dimensionless quantity (ratio, share, markup fraction).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::AddAssign,
)]
pub struct Dimensionless(pub f64);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless::from(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless::from(self.0 / rhs.0)
    }
}

impl Dimensionless {
    pub fn powi(self, rhs: i32) -> Self {
        Dimensionless::from(self.0.powi(rhs))
    }

    /// Restricts the value to the `[min, max]` interval.
    pub fn clamp(self, min: f64, max: f64) -> Self {
        Dimensionless::from(self.0.clamp(min, max))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

impl float_cmp::ApproxEq for Dimensionless {
    type Margin = float_cmp::F64Margin;

    fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
        self.0.approx_eq(other.0, margin.into())
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn from(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Returns the larger of the two values.
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// Returns the smaller of the two values.
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name::from(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name::from(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<f64> for $name {
            type Output = $name;
            fn mul(self, rhs: f64) -> $name {
                $name::from(self.0 * rhs)
            }
        }

        impl std::ops::Mul<$name> for f64 {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name::from(self * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name::from(self.0 / rhs.0)
            }
        }

        impl float_cmp::ApproxEq for $name {
            type Margin = float_cmp::F64Margin;
            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin.into())
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::from(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 / rhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Money);
unit_struct!(Energy);
unit_struct!(Power);
unit_struct!(Length);

// Derived quantities
unit_struct!(MoneyPerEnergy);
unit_struct!(MoneyPerLength);
unit_struct!(EnergyPerPower);

// Division rules
impl_div!(Money, Energy, MoneyPerEnergy);
impl_div!(Money, Length, MoneyPerLength);
impl_div!(Energy, Power, EnergyPerPower);
impl_div!(Power, Power, Dimensionless);
impl_div!(Energy, Energy, Dimensionless);
impl_div!(Energy, EnergyPerPower, Power);

// Multiplication rules
impl_mul!(MoneyPerEnergy, Energy, Money);
impl_mul!(MoneyPerLength, Length, Money);
impl_mul!(EnergyPerPower, Power, Energy);
