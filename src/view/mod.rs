//! View-model construction.
//!
//! Turns the current results and the cached history into one renderable
//! [`SiteView`] per site:
//!
//! ```text
//! ResultsDocument + History
//!        │
//!        ▼
//! Assembler::assemble_dashboard()
//!        │
//!        ├──▶ Classifier        (latency → Tier)
//!        ├──▶ TimelineBuilder   (history → fixed-width Timeline)
//!        └──▶ resolver          (failing site → last known good URL)
//! ```

mod assemble;
mod resolver;
mod tier;
mod timeline;

pub use assemble::*;
pub use resolver::*;
pub use tier::*;
pub use timeline::*;
