//! Release command implementation.

use super::open_store;
use crate::cli::ReleaseArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use reclaim_store::CandidateStore;
use std::fs;
use std::path::Path;

/// What happens to the lease of a released resource that is marked again.
pub const LEASE_NOTICE: &str = "Lease timers are kept: a resource marked again before its lease expires \
keeps the existing deadline; once the lease has expired, marking it again starts a new grace period";

/// Retract records by id; returns how many were removed.
pub fn release(store: &CandidateStore, owner: &str, ids: &[String]) -> Result<usize> {
    match store.clear_candidates(owner, ids) {
        Ok(removed) => Ok(removed),
        Err(e) if e.is_no_candidates() => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Execute the release command.
pub fn execute_release(args: ReleaseArgs, formatter: &Formatter) -> Result<()> {
    let mut ids = args.ids.clone();
    if let Some(path) = &args.file {
        ids.extend(read_ids_from_file(path)?);
    }
    if ids.is_empty() {
        return Err(CliError::InvalidInput("No resource ids provided".to_string()));
    }

    let store = open_store(&args.db.db)?;
    let removed = release(&store, &args.owner, &ids)?;

    if removed == 0 {
        println!("{}", formatter.warning("No matching candidates"));
    } else {
        println!("{}", formatter.success(&format!("Released {} candidate(s)", removed)));
        println!("{}", formatter.info(LEASE_NOTICE));
    }
    Ok(())
}

/// Read ids from a file (one per line).
fn read_ids_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_ids_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "vol-1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  vol-2  ").unwrap();

        let ids = read_ids_from_file(file.path()).unwrap();
        assert_eq!(ids, vec!["vol-1", "vol-2"]);
    }
}
