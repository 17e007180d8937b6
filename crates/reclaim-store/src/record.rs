//! Wire codec for persisted candidate records
//!
//! A record is a JSON object with fields in this order:
//!
//! ```json
//! {"marker_type":0,"candidate_type":"ebs","id":"vol-1","owner":"alice",
//!  "ttl":"1d","purpose":"ci","account":"dev","tags":{"owner":"alice","ttl":"1d"}}
//! ```
//!
//! Field order is fixed by the struct and tag order by the `BTreeMap`, so the
//! same candidate always encodes to the same bytes.

use crate::error::StoreError;
use reclaim_domain::{MarkedCandidate, MarkerType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize)]
struct CandidateRecord {
    marker_type: u8,
    candidate_type: String,
    id: String,
    owner: String,
    ttl: String,
    purpose: String,
    account: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

/// Encode a candidate into its canonical string form
pub fn encode(candidate: &MarkedCandidate) -> Result<String, StoreError> {
    let record = CandidateRecord {
        marker_type: candidate.marker_type.code(),
        candidate_type: candidate.candidate_type.clone(),
        id: candidate.id.clone(),
        owner: candidate.owner.clone(),
        ttl: candidate.ttl.clone(),
        purpose: candidate.purpose.clone(),
        account: candidate.account.clone(),
        tags: candidate.tags.clone(),
    };
    Ok(serde_json::to_string(&record)?)
}

/// Decode a record read back from the cache
pub fn decode(raw: &str) -> Result<MarkedCandidate, StoreError> {
    let record: CandidateRecord =
        serde_json::from_str(raw).map_err(|e| StoreError::Malformed(e.to_string()))?;
    let marker_type = MarkerType::from_code(record.marker_type).ok_or_else(|| {
        StoreError::Malformed(format!("unknown marker type {}", record.marker_type))
    })?;

    Ok(MarkedCandidate {
        marker_type,
        candidate_type: record.candidate_type,
        id: record.id,
        owner: record.owner,
        ttl: record.ttl,
        purpose: record.purpose,
        account: record.account,
        tags: record.tags,
    })
}
