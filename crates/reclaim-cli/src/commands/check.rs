//! Check command implementation.

use crate::cli::CheckArgs;
use crate::error::Result;
use crate::output::Formatter;
use reclaim_lifecycle::{ConfigError, ReclaimConfig};

/// Load and validate a configuration file.
pub fn load_config(args: &CheckArgs) -> Result<ReclaimConfig> {
    let config = ReclaimConfig::from_file(&args.config)?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

/// Execute the check command.
pub fn execute_check(args: CheckArgs, formatter: &Formatter) -> Result<()> {
    let config = load_config(&args)?;
    println!("{}", formatter.config_summary(&config));
    Ok(())
}
