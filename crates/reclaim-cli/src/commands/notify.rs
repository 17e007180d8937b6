//! Notify command implementation.

use super::check::load_config;
use super::open_store;
use crate::cli::CheckArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use reclaim_notify::{LogSink, Notifier, StaticDirectory};
use std::sync::Arc;

/// Execute the notify command.
///
/// Digests go to the log; the static recipient table from the configuration
/// resolves owners.
pub async fn execute_notify(args: CheckArgs, formatter: &Formatter) -> Result<()> {
    let config = load_config(&args)?;
    let notify_config = config.notify.clone().ok_or_else(|| {
        CliError::InvalidInput("configuration has no [notify] section".to_string())
    })?;

    let store = open_store(&config.database)?;
    let directory = StaticDirectory::new(config.recipients.clone());
    let notifier = Notifier::new(store, Arc::new(directory), Arc::new(LogSink), notify_config);

    let report = notifier.notify().await?;
    println!(
        "{}",
        formatter.success(&format!(
            "Notified {} owner(s) in {} message(s), {} item(s)",
            report.owners_notified, report.messages_sent, report.items_sent
        ))
    );
    if report.failures > 0 {
        println!("{}", formatter.warning(&format!("{} owner(s) failed", report.failures)));
    }
    Ok(())
}
