//! Section extraction: narrative record text → clinical fact lists.
//!
//! Extraction never fails. A heading that is absent from the narrative leaves
//! its fact list empty.

pub mod types;
pub mod sections;

pub use types::*;
pub use sections::*;
