//! tm-core: shared vocabulary for the tire test-matrix workbench.
//!
//! Contains:
//! - ids (run numbers, the identity of a row within a store)
//! - protocol (simulation protocols and their field tables)
//! - record (the canonical Run Record)
//! - numeric (number formatting shared by substitution and rendering)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod protocol;
pub mod record;

pub use error::{CoreError, CoreResult};
pub use ids::RunNumber;
pub use numeric::{format_number, parse_number};
pub use protocol::{Field, FieldMarker, Protocol};
pub use record::RunRecord;
