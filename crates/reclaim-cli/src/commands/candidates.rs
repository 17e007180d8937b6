//! Candidates command implementation.

use super::open_store;
use crate::cli::CandidatesArgs;
use crate::error::Result;
use crate::output::{CandidateRow, Formatter};
use reclaim_store::CandidateStore;

/// Collect records, filtered by owner, account and kind.
pub fn collect_rows(store: &CandidateStore, args: &CandidatesArgs) -> Result<Vec<CandidateRow>> {
    let owners = match &args.owner {
        Some(owner) => vec![owner.clone()],
        None => store.list_owners()?,
    };

    let mut rows = Vec::new();
    for owner in owners {
        for candidate in store.list_candidates(&owner)? {
            if args.account.as_ref().is_some_and(|a| *a != candidate.account) {
                continue;
            }
            if args.kind.as_ref().is_some_and(|k| *k != candidate.candidate_type) {
                continue;
            }
            let lease_alive = store.lease_alive(&candidate.id)?;
            rows.push(CandidateRow {
                candidate,
                lease_alive,
            });
        }
    }
    Ok(rows)
}

/// Execute the candidates command.
pub fn execute_candidates(args: CandidatesArgs, formatter: &Formatter) -> Result<()> {
    let store = open_store(&args.db.db)?;
    let rows = collect_rows(&store, &args)?;
    println!("{}", formatter.format_candidates(&rows)?);
    Ok(())
}
