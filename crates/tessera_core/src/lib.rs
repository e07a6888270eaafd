//! Tessera Core
//!
//! Foundational types for the Tessera binding engine:
//!
//! - [`descriptor`]: the struct description algebra (primitives, arrays,
//!   nested structs)
//! - [`layout`]: size / alignment / offset computation
//! - [`authoring`]: JSON text form of descriptors
//! - [`resource`]: resource kind tags shared by the binding layer
//! - [`errors`]: error types

pub mod authoring;
pub mod descriptor;
pub mod errors;
pub mod layout;
pub mod resource;

pub use descriptor::{ArrayLength, FieldType, Primitive, ScalarKind, StructDescriptor};
pub use errors::{LayoutError, Result, TesseraError};
pub use layout::{FieldLayout, FieldLayoutKind, Packing, RuntimeTail, StructLayout, align_up, size_align};
pub use resource::ResourceKind;
