//! Quill C Compiler - Common Types and Utilities
//!
//! This crate contains the identifiers, source locations and error
//! definitions shared between the front-end library and the driver.

pub mod error;
pub mod source_loc;
pub mod types;

pub use error::CompilerError;
pub use source_loc::SourceLocation;
pub use types::{BlockId, Linkage, Storage, SymbolId, TypeId};
