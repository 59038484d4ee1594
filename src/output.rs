//! The module responsible for writing offer outputs to disk.
use crate::offer::{FinancialResult, Offer};
use crate::projection::RoiProjection;
use crate::units::Money;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which quote-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "pvquote_results";

/// The output file name for the frozen offer
const OFFER_FILE_NAME: &str = "offer.toml";

/// The output file name for the ROI projection chart data
const PROJECTION_FILE_NAME: &str = "roi_projection.csv";

/// The output file name for the detailed cost breakdown
const BREAKDOWN_FILE_NAME: &str = "cost_breakdown.csv";

/// Get the output directory for the quote in the specified directory
pub fn get_output_dir(quote_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let quote_dir = quote_dir
        .canonicalize()
        .context("Could not resolve path to quote directory")?;

    let quote_name = quote_dir
        .file_name()
        .context("Quote cannot be in root folder")?
        .to_str()
        .context("Invalid chars in quote dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, quote_name].iter().collect())
}

/// Create a new output directory for a quote.
///
/// # Returns
///
/// Whether an existing directory is being overwritten.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        ensure!(
            overwrite,
            "Output directory {} already exists (pass --overwrite to replace it)",
            output_dir.display()
        );
        return Ok(true);
    }

    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Write the frozen offer to the `offer.toml` file in the output directory.
pub fn write_offer(output_dir: &Path, offer: &Offer) -> Result<()> {
    let contents = toml::to_string(offer).context("Could not serialise offer")?;
    let file_path = output_dir.join(OFFER_FILE_NAME);
    fs::write(&file_path, contents)
        .with_context(|| format!("Could not write {}", file_path.display()))?;

    Ok(())
}

/// Write the year-by-year projection to the `roi_projection.csv` file in the output directory.
pub fn write_projection(output_dir: &Path, projection: &RoiProjection) -> Result<()> {
    let file_path = output_dir.join(PROJECTION_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not write {}", file_path.display()))?;
    for point in &projection.chart {
        writer.serialize(point)?;
    }
    writer.flush()?;

    Ok(())
}

/// Represents a row in the cost breakdown CSV file
#[derive(Serialize)]
struct BreakdownRow<'a> {
    item: &'a str,
    amount: Money,
}

/// Write the detailed cost breakdown to the `cost_breakdown.csv` file in the output directory.
pub fn write_cost_breakdown(output_dir: &Path, result: &FinancialResult) -> Result<()> {
    let costs = &result.costs;
    let rows = [
        ("panels", costs.panels),
        ("inverter", costs.inverter),
        ("storage", costs.storage),
        ("mounting", costs.mounting),
        ("trench", costs.trench),
        ("labour", costs.labour),
        ("energy_management", costs.energy_management),
        ("battery_backup", costs.battery_backup),
        ("org_markup", result.markup.org),
        ("personal_markup", result.markup.personal()),
        ("total_system_price", result.total_system_price),
        ("subsidy_pv", result.subsidies.pv),
        ("subsidy_storage", result.subsidies.storage),
        ("tax_return", result.tax_return),
        ("net_investment", result.net_investment),
    ];

    let file_path = output_dir.join(BREAKDOWN_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not write {}", file_path.display()))?;
    for (item, amount) in rows {
        writer.serialize(BreakdownRow { item, amount })?;
    }
    writer.flush()?;

    Ok(())
}
