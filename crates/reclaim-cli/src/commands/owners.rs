//! Owners command implementation.

use super::open_store;
use crate::cli::DbArgs;
use crate::error::Result;
use crate::output::Formatter;
use reclaim_store::CandidateStore;

/// Every owner with the number of records filed under it.
pub fn owner_counts(store: &CandidateStore) -> Result<Vec<(String, usize)>> {
    let mut counts = Vec::new();
    for owner in store.list_owners()? {
        let count = store.list_candidates(&owner)?.len();
        counts.push((owner, count));
    }
    Ok(counts)
}

/// Execute the owners command.
pub fn execute_owners(args: DbArgs, formatter: &Formatter) -> Result<()> {
    let store = open_store(&args.db)?;
    println!("{}", formatter.format_owners(&owner_counts(&store)?)?);
    Ok(())
}
