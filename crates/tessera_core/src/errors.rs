//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`TesseraError`] covers every failure mode of the
//! layout, view and binding layers:
//! - Malformed struct descriptors ([`LayoutError`])
//! - Offset / alignment guard failures while building views
//! - Resource kind mismatches in bind groups
//! - Attempts to replace composite view fields as a whole
//! - Out-of-range array access
//!
//! All errors are synchronous and local. Nothing is retried internally; the
//! caller fixes the descriptor or resource and repeats the whole operation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tessera_core::errors::{TesseraError, Result};
//!
//! fn build() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::resource::ResourceKind;

/// Reasons a struct descriptor (or a layout derived from it) is rejected.
///
/// `path` fields use dotted field paths relative to the root struct, with
/// `[]` marking an array element, e.g. `lights[].position`. The root itself
/// is reported as `<root>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    // ========================================================================
    // Descriptor shape
    // ========================================================================
    /// A struct (at any depth) declares no fields.
    #[error("struct at `{path}` has no fields")]
    EmptyStruct { path: String },

    /// The same field name appears twice in one struct.
    #[error("duplicate field `{field}` in struct at `{path}`")]
    DuplicateField { path: String, field: String },

    /// The field name is not a valid WGSL identifier.
    #[error("invalid field name `{field}` in struct at `{path}`")]
    InvalidFieldName { path: String, field: String },

    /// A fixed-size array declared with zero elements.
    #[error("array `{path}` has zero length")]
    ZeroLengthArray { path: String },

    /// A runtime-sized array (or a struct ending in one) is not the last field.
    #[error("runtime-sized field `{path}` must be the last field of its struct")]
    RuntimeArrayNotLast { path: String },

    /// A struct ending in a runtime-sized array is used as an array element.
    #[error("array `{path}` uses an unsized struct as its element type")]
    UnsizedArrayElement { path: String },

    /// The byte size of a field or struct does not fit in `usize`.
    #[error("size of `{path}` overflows")]
    SizeOverflow { path: String },

    // ========================================================================
    // Shader emission
    // ========================================================================
    /// Two structs synthesized in one emission would share a WGSL name.
    #[error("struct name `{name}` is declared twice")]
    DuplicateStructName { name: String },

    // ========================================================================
    // Vertex input
    // ========================================================================
    /// The field cannot be expressed as a single vertex attribute.
    #[error("field `{field}` of type `{ty}` cannot be used as a vertex attribute")]
    UnsupportedVertexAttribute { field: String, ty: String },

    // ========================================================================
    // Bind group layout
    // ========================================================================
    /// Two entries of one bind group layout share a name.
    #[error("duplicate binding name `{name}`")]
    DuplicateBindingName { name: String },

    /// Two entries of one bind group layout resolve to the same binding index.
    #[error("binding index {binding} is used by both `{first}` and `{second}`")]
    DuplicateBinding {
        binding: u32,
        first: String,
        second: String,
    },

    /// A uniform buffer struct violates the uniform address space rules.
    #[error("uniform buffer `{name}` violates layout rules at `{path}`: {reason}")]
    UniformConstraint {
        name: String,
        path: String,
        reason: String,
    },

    /// The storage texture format has no WGSL texel format name.
    #[error("storage texture `{name}` uses unsupported format {format}")]
    UnsupportedStorageFormat { name: String, format: String },

    /// The binding type cannot be expressed in WGSL.
    #[error("binding `{name}` is not supported: {reason}")]
    UnsupportedBinding { name: String, reason: String },

    // ========================================================================
    // Authoring
    // ========================================================================
    /// Descriptor text could not be parsed.
    #[error("descriptor parse error: {0}")]
    Parse(String),
}

/// The main error type for the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TesseraError {
    /// The struct descriptor is empty or malformed.
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    // ========================================================================
    // View construction
    // ========================================================================
    /// A field (or the view base) is not placed on its required alignment.
    #[error("Alignment violation at `{path}`: offset {offset} is not a multiple of {align}")]
    AlignmentViolation {
        path: String,
        offset: usize,
        align: usize,
    },

    /// The backing byte region is shorter than the layout requires.
    #[error("Buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall { required: usize, available: usize },

    // ========================================================================
    // View access
    // ========================================================================
    /// A composite field (struct, array slot, vector or matrix) was assigned
    /// as a whole instead of through its leaves.
    #[error("Immutable write: `{path}` cannot be replaced as a whole")]
    ImmutableWrite { path: String },

    /// Array element access outside `[0, len)`.
    #[error("Index out of range: `{path}[{index}]` (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// The struct has no field with this name.
    #[error("Unknown field `{field}`")]
    UnknownField { field: String },

    /// The field exists but has a different kind than the accessor expects.
    #[error("Field `{field}` is {found}, expected {expected}")]
    FieldKindMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Numeric access on a field that is not a scalar.
    #[error("Field `{field}` is not a scalar")]
    NotAScalar { field: String },

    /// A field path could not be parsed.
    #[error("Invalid field path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    // ========================================================================
    // Binding
    // ========================================================================
    /// A resource's kind differs from the kind its entry declares.
    #[error("Type mismatch for binding `{name}`: expected {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: ResourceKind,
        found: ResourceKind,
    },

    /// A bind group was built without a resource for this entry.
    #[error("Missing resource for binding `{name}`")]
    MissingResource { name: String },

    /// Two resources were supplied for the same binding name.
    #[error("Duplicate resource for binding `{name}`")]
    DuplicateResource { name: String },

    /// A resource was supplied for a name the layout does not declare.
    #[error("Unknown binding `{name}`")]
    UnknownBinding { name: String },

    /// The platform backend refused to create an object.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Alias for `Result<T, TesseraError>`.
pub type Result<T> = std::result::Result<T, TesseraError>;
