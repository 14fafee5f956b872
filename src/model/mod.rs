//! Data model for monitor output.
//!
//! Both documents are produced by the external monitoring process: a history
//! document keyed by site and URL, and a current-results document describing
//! the latest check of every site.

mod records;
mod results;

pub use records::*;
pub use results::*;

use thiserror::Error;

/// Top-level shape errors for the monitor's JSON documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("document has no `sites` object")]
    MissingSites,
}
