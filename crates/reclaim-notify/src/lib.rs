//! Reclaim Notifier
//!
//! Tells owners which of their resources are queued for deletion.
//!
//! For each known owner the [`Notifier`] resolves a [`Recipient`] through an
//! [`IdentityResolver`], falling back to the configured default owner, and
//! hands the owner's candidates to a [`DigestSink`] in messages of at most
//! `max_items_per_message` items, pausing between messages.

#![warn(missing_docs)]

mod config;
mod digest;
mod error;
mod notifier;
mod recipient;

pub use config::NotifyConfig;
pub use digest::{chunk_digest, Digest, DigestField, DigestItem, DigestSink, LogSink};
pub use error::NotifyError;
pub use notifier::{NotifyReport, Notifier};
pub use recipient::{looks_like_email, IdentityResolver, Recipient, StaticDirectory};
