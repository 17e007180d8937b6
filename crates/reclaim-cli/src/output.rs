//! Output formatting for the CLI.

use crate::error::Result;
use colored::*;
use reclaim_domain::MarkedCandidate;
use reclaim_lifecycle::ReclaimConfig;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// A candidate record together with the state of its lease.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    /// The stored record
    pub candidate: MarkedCandidate,
    /// Whether the grace period is still running
    pub lease_alive: bool,
}

impl CandidateRow {
    fn lease_label(&self) -> &'static str {
        if self.lease_alive {
            "leased"
        } else {
            "expired"
        }
    }
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format candidate records.
    pub fn format_candidates(&self, rows: &[CandidateRow]) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_candidates_json(rows),
            OutputFormat::Table => Ok(self.format_candidates_table(rows)),
            OutputFormat::Quiet => Ok(rows
                .iter()
                .map(|r| r.candidate.id.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_candidates_json(&self, rows: &[CandidateRow]) -> Result<String> {
        let json_rows: Vec<serde_json::Value> = rows
            .iter()
            .map(|r| {
                let c = &r.candidate;
                serde_json::json!({
                    "id": c.id,
                    "type": c.candidate_type,
                    "marker_type": c.marker_type.as_str(),
                    "account": c.account,
                    "owner": c.owner,
                    "ttl": c.ttl,
                    "purpose": c.purpose,
                    "tags": c.tags,
                    "lease_alive": r.lease_alive,
                })
            })
            .collect();

        Ok(serde_json::to_string_pretty(&json_rows)?)
    }

    fn format_candidates_table(&self, rows: &[CandidateRow]) -> String {
        if rows.is_empty() {
            return self.colorize("No candidates found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Type", "Account", "Owner", "TTL", "Purpose", "Lease"]);

        for row in rows {
            let c = &row.candidate;
            let owner = if c.owner.is_empty() { "-" } else { c.owner.as_str() };
            builder.push_record([
                c.id.as_str(),
                c.candidate_type.as_str(),
                c.account.as_str(),
                owner,
                c.ttl.as_str(),
                c.purpose.as_str(),
                row.lease_label(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format owners with their record counts.
    pub fn format_owners(&self, owners: &[(String, usize)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = owners
                    .iter()
                    .map(|(owner, count)| serde_json::json!({ "owner": owner, "candidates": count }))
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(owners
                .iter()
                .map(|(owner, _)| owner.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if owners.is_empty() {
                    return Ok(self.colorize("No owners found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Owner", "Candidates"]);
                for (owner, count) in owners {
                    let owner = if owner.is_empty() { "-" } else { owner.as_str() };
                    builder.push_record([owner.to_string(), count.to_string()]);
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(table.to_string())
            }
        }
    }

    /// Describe a validated configuration.
    pub fn config_summary(&self, config: &ReclaimConfig) -> String {
        let mut lines = vec![self.success(&format!(
            "Configuration valid: {} account(s), database {}",
            config.accounts.len(),
            config.database.display()
        ))];
        for account in &config.accounts {
            let mode = if account.delete_enabled {
                self.colorize("delete", "red")
            } else {
                "dry-run".to_string()
            };
            lines.push(format!(
                "  {} [{}] kinds: {} grace: {} mode: {}",
                account.account,
                account.marker_type,
                account.kinds.join(", "),
                account.grace_period,
                mode
            ));
        }
        match &config.notify {
            Some(notify) => lines.push(format!(
                "  notify: default owner {}, {} per message",
                notify.default_owner, notify.max_items_per_message
            )),
            None => lines.push("  notify: disabled".to_string()),
        }
        lines.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
