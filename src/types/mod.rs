//! Core type definitions.
//!
//! Descriptors are validated at construction so that the engine and the
//! transport never see an unresolved area name or an empty range.

mod area;
mod format;
mod sample;

pub use area::{AreaDescriptor, AreaKind};
pub use format::FormatSpec;
pub use sample::Sample;
