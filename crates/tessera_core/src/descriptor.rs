//! Struct Descriptors
//!
//! The recursive type algebra that describes the shape of a GPU-shareable
//! struct. A descriptor is authored once and then consumed by the layout
//! calculator, the CPU view builder and the WGSL emitter, so all three agree
//! on field order and placement.
//!
//! ```rust,ignore
//! let light = StructDescriptor::new()
//!     .with("position", Primitive::VEC3_F32)
//!     .with("range", Primitive::F32);
//!
//! let lights = StructDescriptor::new()
//!     .with("ambient", Primitive::VEC3_F32)
//!     .with("light_count", Primitive::U32)
//!     .with("lights", FieldType::array(light, 4));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::errors::LayoutError;
use crate::layout::StructLayout;

// ============================================================================
// Primitives
// ============================================================================

/// Numeric representation of a primitive's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    F32,
    U32,
    I32,
}

impl ScalarKind {
    #[must_use]
    pub const fn wgsl_name(self) -> &'static str {
        match self {
            ScalarKind::F32 => "f32",
            ScalarKind::U32 => "u32",
            ScalarKind::I32 => "i32",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "f32" => Some(ScalarKind::F32),
            "u32" => Some(ScalarKind::U32),
            "i32" => Some(ScalarKind::I32),
            _ => None,
        }
    }
}

/// A scalar, vector or matrix leaf type.
///
/// | Primitive | size | align |
/// |-----------|------|-------|
/// | scalar    | 4    | 4     |
/// | vec2      | 8    | 8     |
/// | vec3      | 12   | 16    |
/// | vec4      | 16   | 16    |
/// | mat3x3    | 48   | 16    |
/// | mat4x4    | 64   | 16    |
///
/// Matrices are column-major over `f32`; a `mat3x3` stores three columns of
/// `vec3` padded to 16 bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Scalar(ScalarKind),
    Vec2(ScalarKind),
    Vec3(ScalarKind),
    Vec4(ScalarKind),
    Mat3x3,
    Mat4x4,
}

impl Primitive {
    pub const F32: Self = Primitive::Scalar(ScalarKind::F32);
    pub const U32: Self = Primitive::Scalar(ScalarKind::U32);
    pub const I32: Self = Primitive::Scalar(ScalarKind::I32);
    pub const VEC2_F32: Self = Primitive::Vec2(ScalarKind::F32);
    pub const VEC3_F32: Self = Primitive::Vec3(ScalarKind::F32);
    pub const VEC4_F32: Self = Primitive::Vec4(ScalarKind::F32);
    pub const VEC2_U32: Self = Primitive::Vec2(ScalarKind::U32);
    pub const VEC3_U32: Self = Primitive::Vec3(ScalarKind::U32);
    pub const VEC4_U32: Self = Primitive::Vec4(ScalarKind::U32);
    pub const VEC2_I32: Self = Primitive::Vec2(ScalarKind::I32);
    pub const VEC3_I32: Self = Primitive::Vec3(ScalarKind::I32);
    pub const VEC4_I32: Self = Primitive::Vec4(ScalarKind::I32);
    pub const MAT3X3_F32: Self = Primitive::Mat3x3;
    pub const MAT4X4_F32: Self = Primitive::Mat4x4;

    /// Size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Primitive::Scalar(_) => 4,
            Primitive::Vec2(_) => 8,
            Primitive::Vec3(_) => 12,
            Primitive::Vec4(_) => 16,
            Primitive::Mat3x3 => 48,
            Primitive::Mat4x4 => 64,
        }
    }

    /// Alignment in bytes under the standard (host-shareable) rules.
    #[must_use]
    pub const fn align(self) -> usize {
        match self {
            Primitive::Scalar(_) => 4,
            Primitive::Vec2(_) => 8,
            Primitive::Vec3(_) | Primitive::Vec4(_) | Primitive::Mat3x3 | Primitive::Mat4x4 => 16,
        }
    }

    /// Number of 4-byte components a CPU window over this primitive exposes,
    /// padding included (`mat3x3` → 12).
    #[must_use]
    pub const fn component_count(self) -> usize {
        self.size() / 4
    }

    #[must_use]
    pub const fn scalar_kind(self) -> ScalarKind {
        match self {
            Primitive::Scalar(k) | Primitive::Vec2(k) | Primitive::Vec3(k) | Primitive::Vec4(k) => k,
            Primitive::Mat3x3 | Primitive::Mat4x4 => ScalarKind::F32,
        }
    }

    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Primitive::Scalar(_))
    }

    #[must_use]
    pub const fn is_matrix(self) -> bool {
        matches!(self, Primitive::Mat3x3 | Primitive::Mat4x4)
    }

    /// WGSL spelling, e.g. `vec3<f32>`.
    #[must_use]
    pub const fn wgsl_name(self) -> &'static str {
        use ScalarKind::{F32, I32, U32};
        match self {
            Primitive::Scalar(k) => k.wgsl_name(),
            Primitive::Vec2(F32) => "vec2<f32>",
            Primitive::Vec2(U32) => "vec2<u32>",
            Primitive::Vec2(I32) => "vec2<i32>",
            Primitive::Vec3(F32) => "vec3<f32>",
            Primitive::Vec3(U32) => "vec3<u32>",
            Primitive::Vec3(I32) => "vec3<i32>",
            Primitive::Vec4(F32) => "vec4<f32>",
            Primitive::Vec4(U32) => "vec4<u32>",
            Primitive::Vec4(I32) => "vec4<i32>",
            Primitive::Mat3x3 => "mat3x3<f32>",
            Primitive::Mat4x4 => "mat4x4<f32>",
        }
    }

    /// Token form used by JSON descriptors, e.g. `vec3_f32`.
    #[must_use]
    pub fn token(self) -> String {
        match self {
            Primitive::Scalar(k) => k.wgsl_name().to_string(),
            other => other.wgsl_name().replace('<', "_").replace('>', ""),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl_name())
    }
}

impl FromStr for Primitive {
    type Err = LayoutError;

    /// Accepts both `vec3_f32` and `vec3<f32>` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || LayoutError::Parse(format!("unknown primitive `{s}`"));

        if let Some(kind) = ScalarKind::parse(s) {
            return Ok(Primitive::Scalar(kind));
        }

        let (head, tail) = if let Some(rest) = s.strip_suffix('>') {
            rest.split_once('<').ok_or_else(unknown)?
        } else {
            s.split_once('_').ok_or_else(unknown)?
        };
        let kind = ScalarKind::parse(tail).ok_or_else(unknown)?;

        match (head, kind) {
            ("vec2", k) => Ok(Primitive::Vec2(k)),
            ("vec3", k) => Ok(Primitive::Vec3(k)),
            ("vec4", k) => Ok(Primitive::Vec4(k)),
            ("mat3x3", ScalarKind::F32) => Ok(Primitive::Mat3x3),
            ("mat4x4", ScalarKind::F32) => Ok(Primitive::Mat4x4),
            _ => Err(unknown()),
        }
    }
}

// ============================================================================
// Field types
// ============================================================================

/// Element count of an array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayLength {
    Fixed(usize),
    /// Sized when a buffer is allocated; only legal as the last field.
    Runtime,
}

/// The type of one struct field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Primitive(Primitive),
    Array {
        element: Arc<StructDescriptor>,
        length: ArrayLength,
    },
    Struct(Arc<StructDescriptor>),
}

impl FieldType {
    /// A fixed-length array of `element` structs.
    pub fn array(element: impl Into<Arc<StructDescriptor>>, length: usize) -> Self {
        FieldType::Array {
            element: element.into(),
            length: ArrayLength::Fixed(length),
        }
    }

    /// A runtime-sized trailing array of `element` structs.
    pub fn runtime_array(element: impl Into<Arc<StructDescriptor>>) -> Self {
        FieldType::Array {
            element: element.into(),
            length: ArrayLength::Runtime,
        }
    }

    pub fn nested(desc: impl Into<Arc<StructDescriptor>>) -> Self {
        FieldType::Struct(desc.into())
    }

    #[must_use]
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            FieldType::Primitive(p) => Some(*p),
            _ => None,
        }
    }
}

impl From<Primitive> for FieldType {
    fn from(p: Primitive) -> Self {
        FieldType::Primitive(p)
    }
}

impl From<StructDescriptor> for FieldType {
    fn from(desc: StructDescriptor) -> Self {
        FieldType::Struct(Arc::new(desc))
    }
}

impl From<Arc<StructDescriptor>> for FieldType {
    fn from(desc: Arc<StructDescriptor>) -> Self {
        FieldType::Struct(desc)
    }
}

// ============================================================================
// Struct descriptor
// ============================================================================

/// An ordered list of uniquely named fields.
///
/// Declaration order determines byte layout and is preserved through layout
/// computation, view construction and WGSL emission.
///
/// Validation (empty structs, duplicate names, misplaced runtime arrays) is
/// deferred to layout computation, see [`StructDescriptor::layout`].
/// Computed layouts are cached on the descriptor instance.
#[derive(Debug, Clone, Default)]
pub struct StructDescriptor {
    fields: Vec<(String, FieldType)>,
    pub(crate) standard_layout: OnceLock<Arc<StructLayout>>,
    pub(crate) tight_layout: OnceLock<Arc<StructLayout>>,
}

impl StructDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field and returns the descriptor (builder style).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.push(name, ty);
        self
    }

    /// Appends a field. Any cached layout is discarded.
    pub fn push(&mut self, name: impl Into<String>, ty: impl Into<FieldType>) {
        self.fields.push((name.into(), ty.into()));
        self.standard_layout = OnceLock::new();
        self.tight_layout = OnceLock::new();
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, ty)| ty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for StructDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl<N: Into<String>, T: Into<FieldType>> FromIterator<(N, T)> for StructDescriptor {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let mut desc = StructDescriptor::new();
        for (name, ty) in iter {
            desc.push(name, ty);
        }
        desc
    }
}

/// Whether `name` is usable as a WGSL struct member identifier.
#[must_use]
pub fn is_wgsl_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if name == "_" || name.starts_with("__") {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
