//! Pricing and financial projection engine for solar installation sales offers.
#![warn(missing_docs)]
pub mod catalog;
pub mod cli;
pub mod id;
pub mod input;
pub mod loan;
pub mod log;
pub mod margins;
pub mod offer;
pub mod output;
pub mod pricing;
pub mod projection;
pub mod quote;
pub mod selection;
pub mod settings;
pub mod units;

#[cfg(test)]
mod fixture;

use std::path::PathBuf;

/// Get the directory where the program's configuration is stored.
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_default().join("pvquote")
}
