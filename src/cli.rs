//! The command line interface for the quoting engine.
use crate::catalog::read_catalog;
use crate::loan::{first_payment_date, monthly_payment};
use crate::log;
use crate::margins::{MarginSchedule, OrgPricingSettings};
use crate::offer::{Offer, OfferID, compute_offer};
use crate::output::{
    create_output_directory, get_output_dir, write_cost_breakdown, write_offer, write_projection,
};
use crate::quote::QuoteConfiguration;
use crate::selection::auto_select;
use crate::settings::{Settings, get_settings_file_path};
use crate::units::Money;
use ::log::{info, warn};
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

/// The command line interface for the quoting engine.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the quote command
#[derive(Args)]
pub struct QuoteOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write the detailed cost breakdown CSV
    #[arg(long)]
    pub breakdown: bool,
    /// Replace the component selection with the auto-selection heuristic's recommendation
    #[arg(long)]
    pub auto_select: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Price a quote and freeze the resulting offer.
    Quote {
        /// Path to the quote directory.
        quote_dir: PathBuf,
        /// Other quote options
        #[command(flatten)]
        opts: QuoteOpts,
    },
    /// Validate a quote directory.
    Validate {
        /// The path to the quote directory.
        quote_dir: PathBuf,
    },
    /// Compute the monthly payment for financing an offer.
    Loan {
        /// Loan principal in PLN
        principal: f64,
        /// Term in months
        term_months: u32,
        /// Annual interest rate in percent
        #[arg(default_value_t = 0.0)]
        annual_rate: f64,
        /// Months before the first payment is due
        #[arg(long, default_value_t = 0)]
        deferment_months: u32,
    },
    /// Manage the program settings file.
    Settings {
        /// The available subcommands for managing settings
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Create the settings file with commented defaults, if it doesn't already exist
    Init,
    /// Get the path to where the settings file is read from
    Path,
    /// Write the contents of a placeholder `settings.toml` to the console
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Init => handle_settings_init_command()?,
            Self::Path => println!("{}", get_settings_file_path().display()),
            Self::DumpDefault => print!("{}", Settings::default_file_contents()),
        }

        Ok(())
    }
}

/// Create the settings file from the commented defaults, if it doesn't already exist
fn ensure_settings_file_exists(file_path: &Path) -> Result<()> {
    if file_path.is_file() {
        // File already exists
        return Ok(());
    }

    if let Some(dir_path) = file_path.parent() {
        // Create parent directory
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }

    // Create placeholder settings file
    fs::write(file_path, Settings::default_file_contents())?;

    Ok(())
}

/// Handle the `settings init` command
fn handle_settings_init_command() -> Result<()> {
    let file_path = get_settings_file_path();
    ensure_settings_file_exists(&file_path)?;
    println!("Settings file: {}", file_path.display());

    Ok(())
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Quote { quote_dir, opts } => handle_quote_command(&quote_dir, &opts, None),
            Self::Validate { quote_dir } => handle_validate_command(&quote_dir, None),
            Self::Loan {
                principal,
                term_months,
                annual_rate,
                deferment_months,
            } => {
                handle_loan_command(principal, term_months, annual_rate, deferment_months);
                Ok(())
            }
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start pvquote
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ pvquote --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `quote` command.
pub fn handle_quote_command(
    quote_dir: &Path,
    opts: &QuoteOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let mut settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // These settings can be overridden by command-line arguments
    if opts.overwrite {
        settings.overwrite = true;
    }
    if opts.breakdown {
        settings.breakdown = true;
    }

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(quote_dir)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, settings.overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;

    // Load the quote to price
    let mut config = QuoteConfiguration::from_path(quote_dir).context("Failed to load quote.")?;
    let catalog = read_catalog(quote_dir).context("Failed to load catalogue.")?;
    let margins =
        MarginSchedule::from_path(quote_dir).context("Failed to load margin schedule.")?;
    let org = OrgPricingSettings::from_path(quote_dir)
        .context("Failed to load organisation settings.")?;
    info!("Loaded quote from {}", quote_dir.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    if opts.auto_select {
        let patch = auto_select(&config, &catalog);
        patch.apply_to(&mut config);
        info!(
            "Auto-selected {} panel(s), inverter {}, {} storage unit(s)",
            patch.panel_count,
            patch
                .inverter
                .as_ref()
                .map_or("(none)", |id| id.0.as_ref()),
            patch.storage_count
        );
    }

    // Derive the financial result from the full configuration
    let result = compute_offer(&config, &catalog, &margins, &org);

    // Policy gate: exceeding the connection power limit blocks the offer until acknowledged
    if result.power_check.exceeds {
        if !config.power_risk_acknowledged {
            bail!(
                "Computed connection power {:.1} kW exceeds the {:.1} kW limit; set \
                 power_risk_acknowledged in quote.toml to proceed",
                result.power_check.power.value(),
                result.power_check.limit.value()
            );
        }
        warn!(
            "Connection power {:.1} kW exceeds the {:.1} kW limit (risk acknowledged)",
            result.power_check.power.value(),
            result.power_check.limit.value()
        );
    }

    info!(
        "Total system price: {:.2} PLN",
        result.total_system_price.value()
    );
    info!(
        "Subsidies: {:.2} PLN, tax return: {:.2} PLN",
        result.subsidies.total().value(),
        result.tax_return.value()
    );
    info!("Net investment: {:.2} PLN", result.net_investment.value());
    match result.projection.payback_year {
        Some(year) => info!("Estimated payback in year {year}"),
        None => info!("No payback within the projection horizon"),
    }

    // Freeze and persist the offer
    let name = quote_dir
        .canonicalize()
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "offer".to_string());
    let offer = Offer::freeze(
        OfferID::new(&name),
        &name,
        Local::now().date_naive(),
        &config,
        &catalog,
        &result,
    );
    write_offer(output_path, &offer)?;
    write_projection(output_path, &result.projection)?;
    if settings.breakdown {
        write_cost_breakdown(output_path, &result)?;
    }
    info!("Offer written to {}", output_path.display());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(quote_dir: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    // Load/validate the quote inputs
    QuoteConfiguration::from_path(quote_dir).context("Failed to validate quote.")?;
    read_catalog(quote_dir).context("Failed to validate catalogue.")?;
    MarginSchedule::from_path(quote_dir).context("Failed to validate margin schedule.")?;
    OrgPricingSettings::from_path(quote_dir)
        .context("Failed to validate organisation settings.")?;
    info!("Quote validation successful!");

    Ok(())
}

/// Handle the `loan` command.
pub fn handle_loan_command(
    principal: f64,
    term_months: u32,
    annual_rate: f64,
    deferment_months: u32,
) {
    let payment = monthly_payment(Money(principal), term_months, annual_rate);
    let total = payment * f64::from(term_months);
    let first_due = first_payment_date(Local::now().date_naive(), deferment_months);

    println!("Monthly payment:  {:.2} PLN", payment.value());
    println!("Total repayment:  {:.2} PLN", total.value());
    println!("First payment due: {first_due}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_settings_file_exists() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("subdir").join("settings.toml");

        // Creates the file and its parent directory with the commented defaults
        ensure_settings_file_exists(&file_path).unwrap();
        let contents = fs::read_to_string(&file_path).unwrap();
        assert_eq!(contents, Settings::default_file_contents());

        // A second call leaves an existing file untouched
        fs::write(&file_path, "log_level = \"warn\"\n").unwrap();
        ensure_settings_file_exists(&file_path).unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "log_level = \"warn\"\n");
    }
}
