//! Zero-Copy Struct Views
//!
//! A view is a typed accessor tree over a raw byte region laid out according
//! to a [`StructLayout`]. Nothing is copied: scalar accessors read and write
//! the bytes in place, vector and matrix fields are exposed as numeric
//! windows (`&mut [f32]` etc.) into the same region, and nested structs and
//! array elements are sub-views at computed offsets.
//!
//! The shape of a view is frozen by its layout. Leaves are mutable;
//! composite fields (structs, array slots, vectors, matrices) can only be
//! changed through their leaves, and any attempt to assign one as a whole
//! fails with [`TesseraError::ImmutableWrite`].
//!
//! Scalars are stored little-endian. Windows use host byte order, which is
//! little-endian on every GPU-capable target.
//!
//! # Field paths
//!
//! Besides per-field accessors, views accept dotted paths with array
//! indices, e.g. `lights[2].color`:
//!
//! ```rust,ignore
//! let mut view = buffer.view_mut();
//! view.set("light_count", 2.0)?;
//! view.set_path("lights[1].range", 10.0)?;
//! view.window_path_mut::<f32>("lights[1].color")?.copy_from_slice(&[1.0, 0.5, 0.0]);
//! ```

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use tessera_core::descriptor::{ArrayLength, Primitive, ScalarKind};
use tessera_core::errors::{LayoutError, Result, TesseraError};
use tessera_core::layout::{FieldLayoutKind, Packing, StructLayout};

// ============================================================================
// Window element types
// ============================================================================

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for u32 {}
    impl Sealed for i32 {}
}

/// Component types a vector / matrix window can be viewed as.
pub trait WindowElement: bytemuck::Pod + sealed::Sealed {
    const KIND: ScalarKind;
}

impl WindowElement for f32 {
    const KIND: ScalarKind = ScalarKind::F32;
}

impl WindowElement for u32 {
    const KIND: ScalarKind = ScalarKind::U32;
}

impl WindowElement for i32 {
    const KIND: ScalarKind = ScalarKind::I32;
}

// ============================================================================
// Number conversion
// ============================================================================

/// Converts a number to `u32` by truncation and modulo 2^32, so `-1.0`
/// becomes `4294967295`. Non-finite input yields 0.
#[must_use]
pub fn wrap_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// Two's-complement counterpart of [`wrap_u32`].
#[must_use]
pub fn wrap_i32(value: f64) -> i32 {
    wrap_u32(value) as i32
}

fn read_word(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn write_word(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

// ============================================================================
// Slot resolution
// ============================================================================

/// A struct placed at an absolute offset.
#[derive(Clone, Copy)]
struct Cursor<'a> {
    layout: &'a StructLayout,
    base: usize,
    runtime_len: usize,
}

/// What a field (or path) resolves to, with absolute offsets.
#[derive(Clone, Copy)]
enum Slot<'a> {
    Scalar {
        offset: usize,
        kind: ScalarKind,
    },
    Window {
        offset: usize,
        primitive: Primitive,
    },
    Struct(Cursor<'a>),
    Array {
        offset: usize,
        element: &'a StructLayout,
        stride: usize,
        len: usize,
    },
}

impl<'a> Cursor<'a> {
    fn slot(self, name: &str) -> Result<Slot<'a>> {
        let field = self.layout.field(name).ok_or_else(|| TesseraError::UnknownField {
            field: name.to_string(),
        })?;
        let offset = self.base + field.offset;
        Ok(match &field.kind {
            FieldLayoutKind::Primitive(p) if p.is_scalar() => Slot::Scalar {
                offset,
                kind: p.scalar_kind(),
            },
            FieldLayoutKind::Primitive(p) => Slot::Window { offset, primitive: *p },
            FieldLayoutKind::Struct(inner) => Slot::Struct(Cursor {
                layout: inner,
                base: offset,
                runtime_len: self.runtime_len,
            }),
            FieldLayoutKind::Array {
                element,
                length,
                stride,
            } => Slot::Array {
                offset,
                element,
                stride: *stride,
                len: match length {
                    ArrayLength::Fixed(n) => *n,
                    ArrayLength::Runtime => self.runtime_len,
                },
            },
        })
    }
}

fn slot_kind_name(slot: &Slot<'_>) -> String {
    match slot {
        Slot::Scalar { kind, .. } => kind.wgsl_name().to_string(),
        Slot::Window { primitive, .. } => primitive.wgsl_name().to_string(),
        Slot::Struct(_) => "a struct".to_string(),
        Slot::Array { .. } => "an array".to_string(),
    }
}

fn element_cursor(element: &StructLayout, offset: usize, stride: usize, index: usize) -> Cursor<'_> {
    Cursor {
        layout: element,
        base: offset + stride * index,
        runtime_len: 0,
    }
}

enum Segment<'p> {
    Field(&'p str),
    Index(usize),
}

fn parse_path(path: &str) -> Result<Vec<Segment<'_>>> {
    let invalid = |reason: &str| TesseraError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut rest) = match part.find('[') {
            Some(i) => (&part[..i], &part[i..]),
            None => (part, ""),
        };
        if name.is_empty() {
            return Err(invalid("empty field name"));
        }
        segments.push(Segment::Field(name));
        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| invalid("unclosed `[`"))?;
            let index = rest[1..close]
                .parse::<usize>()
                .map_err(|_| invalid("array index is not a number"))?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(invalid("unexpected text after `]`"));
            }
        }
    }
    Ok(segments)
}

fn resolve_path<'a>(root: Cursor<'a>, path: &str) -> Result<Slot<'a>> {
    let mut current = Slot::Struct(root);
    let mut walked = String::new();

    for segment in parse_path(path)? {
        current = match (segment, current) {
            (Segment::Field(name), Slot::Struct(cursor)) => {
                if !walked.is_empty() {
                    walked.push('.');
                }
                walked.push_str(name);
                cursor.slot(name)?
            }
            (
                Segment::Index(index),
                Slot::Array {
                    offset,
                    element,
                    stride,
                    len,
                },
            ) => {
                if index >= len {
                    return Err(TesseraError::IndexOutOfRange {
                        path: walked,
                        index,
                        len,
                    });
                }
                walked.push_str(&format!("[{index}]"));
                Slot::Struct(element_cursor(element, offset, stride, index))
            }
            (Segment::Field(_), _) => {
                return Err(TesseraError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("`{walked}` is not a struct"),
                });
            }
            (Segment::Index(_), _) => {
                return Err(TesseraError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("`{walked}` is not an array"),
                });
            }
        };
    }
    Ok(current)
}

// ============================================================================
// Shared read / write primitives
// ============================================================================

fn read_number(bytes: &[u8], slot: Slot<'_>, field: &str) -> Result<f64> {
    match slot {
        Slot::Scalar { offset, kind } => {
            let word = read_word(bytes, offset);
            Ok(match kind {
                ScalarKind::F32 => f64::from(f32::from_bits(word)),
                ScalarKind::U32 => f64::from(word),
                ScalarKind::I32 => f64::from(word as i32),
            })
        }
        _ => Err(TesseraError::NotAScalar {
            field: field.to_string(),
        }),
    }
}

fn write_number(bytes: &mut [u8], slot: Slot<'_>, field: &str, value: f64) -> Result<()> {
    match slot {
        Slot::Scalar { offset, kind } => {
            let word = match kind {
                ScalarKind::F32 => (value as f32).to_bits(),
                ScalarKind::U32 => wrap_u32(value),
                ScalarKind::I32 => wrap_i32(value) as u32,
            };
            write_word(bytes, offset, word);
            Ok(())
        }
        _ => Err(TesseraError::ImmutableWrite {
            path: field.to_string(),
        }),
    }
}

fn scalar_offset(slot: Slot<'_>, field: &str, expected: ScalarKind) -> Result<usize> {
    match slot {
        Slot::Scalar { offset, kind } if kind == expected => Ok(offset),
        other => Err(TesseraError::FieldKindMismatch {
            field: field.to_string(),
            expected: expected.wgsl_name().to_string(),
            found: slot_kind_name(&other),
        }),
    }
}

fn window_range<T: WindowElement>(slot: Slot<'_>, field: &str) -> Result<(usize, usize)> {
    match slot {
        Slot::Window { offset, primitive } if primitive.scalar_kind() == T::KIND => {
            Ok((offset, offset + primitive.size()))
        }
        other => Err(TesseraError::FieldKindMismatch {
            field: field.to_string(),
            expected: format!("a vector or matrix of {}", T::KIND.wgsl_name()),
            found: slot_kind_name(&other),
        }),
    }
}

fn typed_window_range(slot: Slot<'_>, field: &str, expected: Primitive) -> Result<(usize, usize)> {
    match slot {
        Slot::Window { offset, primitive } if primitive == expected => Ok((offset, offset + primitive.size())),
        other => Err(TesseraError::FieldKindMismatch {
            field: field.to_string(),
            expected: expected.wgsl_name().to_string(),
            found: slot_kind_name(&other),
        }),
    }
}

fn misaligned(field: &str, offset: usize) -> TesseraError {
    TesseraError::AlignmentViolation {
        path: field.to_string(),
        offset,
        align: 4,
    }
}

fn cast_window<'b, T: WindowElement>(bytes: &'b [u8], range: (usize, usize), field: &str) -> Result<&'b [T]> {
    bytemuck::try_cast_slice(&bytes[range.0..range.1]).map_err(|_| misaligned(field, range.0))
}

fn cast_window_mut<'b, T: WindowElement>(
    bytes: &'b mut [u8],
    range: (usize, usize),
    field: &str,
) -> Result<&'b mut [T]> {
    bytemuck::try_cast_slice_mut(&mut bytes[range.0..range.1]).map_err(|_| misaligned(field, range.0))
}

fn expect_struct<'a>(slot: Slot<'a>, field: &str) -> Result<Cursor<'a>> {
    match slot {
        Slot::Struct(cursor) => Ok(cursor),
        other => Err(TesseraError::FieldKindMismatch {
            field: field.to_string(),
            expected: "a struct".to_string(),
            found: slot_kind_name(&other),
        }),
    }
}

// ============================================================================
// View builder
// ============================================================================

/// Validates a layout against a byte region and produces views over it.
///
/// Construction checks that the region is long enough, that every field's
/// absolute offset honours its alignment, and that the memory can host
/// aligned 4-byte numeric windows.
#[derive(Debug, Clone, Copy)]
pub struct ViewBuilder<'l> {
    layout: &'l StructLayout,
    base_offset: usize,
    runtime_len: usize,
}

impl<'l> ViewBuilder<'l> {
    #[must_use]
    pub fn new(layout: &'l StructLayout) -> Self {
        Self {
            layout,
            base_offset: 0,
            runtime_len: 0,
        }
    }

    /// Byte offset of the struct within the region.
    #[must_use]
    pub fn base_offset(mut self, offset: usize) -> Self {
        self.base_offset = offset;
        self
    }

    /// Element count of the trailing runtime-sized array, if any.
    #[must_use]
    pub fn runtime_len(mut self, len: usize) -> Self {
        self.runtime_len = len;
        self
    }

    /// Bytes the region must hold past the base offset.
    pub fn required_len(&self) -> Result<usize> {
        self.layout.size_for(self.runtime_len)
    }

    pub fn build<'a>(self, bytes: &'a [u8]) -> Result<View<'a>>
    where
        'l: 'a,
    {
        self.validate(bytes)?;
        Ok(View {
            cursor: self.cursor(),
            bytes,
        })
    }

    pub fn build_mut<'a>(self, bytes: &'a mut [u8]) -> Result<ViewMut<'a>>
    where
        'l: 'a,
    {
        self.validate(bytes)?;
        Ok(ViewMut {
            cursor: self.cursor(),
            bytes,
        })
    }

    fn cursor(self) -> Cursor<'l> {
        Cursor {
            layout: self.layout,
            base: self.base_offset,
            runtime_len: self.runtime_len,
        }
    }

    pub(crate) fn validate(&self, bytes: &[u8]) -> Result<()> {
        let required = self
            .base_offset
            .checked_add(self.required_len()?)
            .ok_or_else(|| LayoutError::SizeOverflow {
                path: "<root>".to_string(),
            })?;
        if bytes.len() < required {
            return Err(TesseraError::BufferTooSmall {
                required,
                available: bytes.len(),
            });
        }

        let address = bytes.as_ptr() as usize + self.base_offset;
        if address % 4 != 0 {
            return Err(misaligned("<root>", self.base_offset));
        }

        if self.layout.packing() == Packing::Standard {
            check_alignment(self.layout, self.base_offset, "<root>")?;
        }
        Ok(())
    }
}

/// Guard: every field's absolute offset must be a multiple of its alignment.
fn check_alignment(layout: &StructLayout, base: usize, path: &str) -> Result<()> {
    if base % layout.align() != 0 {
        return Err(TesseraError::AlignmentViolation {
            path: path.to_string(),
            offset: base,
            align: layout.align(),
        });
    }

    for field in layout.fields() {
        let offset = base + field.offset;
        let field_path = if path == "<root>" {
            field.name.clone()
        } else {
            format!("{path}.{}", field.name)
        };
        if offset % field.align != 0 {
            return Err(TesseraError::AlignmentViolation {
                path: field_path,
                offset,
                align: field.align,
            });
        }
        match &field.kind {
            FieldLayoutKind::Primitive(_) => {}
            FieldLayoutKind::Struct(inner) => check_alignment(inner, offset, &field_path)?,
            FieldLayoutKind::Array { element, stride, .. } => {
                if stride % element.align() != 0 {
                    return Err(TesseraError::AlignmentViolation {
                        path: format!("{field_path}[]"),
                        offset: *stride,
                        align: element.align(),
                    });
                }
                check_alignment(element, offset, &format!("{field_path}[]"))?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// Read-only view
// ============================================================================

/// Read-only view over a struct.
#[derive(Clone, Copy)]
pub struct View<'a> {
    cursor: Cursor<'a>,
    bytes: &'a [u8],
}

impl<'a> View<'a> {
    pub(crate) fn from_validated(builder: ViewBuilder<'a>, bytes: &'a [u8]) -> Self {
        Self {
            cursor: builder.cursor(),
            bytes,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &'a StructLayout {
        self.cursor.layout
    }

    /// Absolute byte offset of this struct within the backing region.
    #[must_use]
    pub fn byte_offset(&self) -> usize {
        self.cursor.base
    }

    /// Absolute byte offset of a field.
    pub fn offset_of(&self, name: &str) -> Result<usize> {
        let field = self.cursor.layout.field(name).ok_or_else(|| TesseraError::UnknownField {
            field: name.to_string(),
        })?;
        Ok(self.cursor.base + field.offset)
    }

    /// Reads a scalar field as a number.
    pub fn get(&self, name: &str) -> Result<f64> {
        read_number(self.bytes, self.cursor.slot(name)?, name)
    }

    pub fn get_f32(&self, name: &str) -> Result<f32> {
        let offset = scalar_offset(self.cursor.slot(name)?, name, ScalarKind::F32)?;
        Ok(f32::from_bits(read_word(self.bytes, offset)))
    }

    pub fn get_u32(&self, name: &str) -> Result<u32> {
        let offset = scalar_offset(self.cursor.slot(name)?, name, ScalarKind::U32)?;
        Ok(read_word(self.bytes, offset))
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        let offset = scalar_offset(self.cursor.slot(name)?, name, ScalarKind::I32)?;
        Ok(read_word(self.bytes, offset) as i32)
    }

    /// The components of a vector or matrix field.
    pub fn window<T: WindowElement>(&self, name: &str) -> Result<&'a [T]> {
        let range = window_range::<T>(self.cursor.slot(name)?, name)?;
        cast_window(self.bytes, range, name)
    }

    pub fn vec2(&self, name: &str) -> Result<Vec2> {
        let range = typed_window_range(self.cursor.slot(name)?, name, Primitive::VEC2_F32)?;
        Ok(Vec2::from_slice(cast_window::<f32>(self.bytes, range, name)?))
    }

    pub fn vec3(&self, name: &str) -> Result<Vec3> {
        let range = typed_window_range(self.cursor.slot(name)?, name, Primitive::VEC3_F32)?;
        Ok(Vec3::from_slice(cast_window::<f32>(self.bytes, range, name)?))
    }

    pub fn vec4(&self, name: &str) -> Result<Vec4> {
        let range = typed_window_range(self.cursor.slot(name)?, name, Primitive::VEC4_F32)?;
        Ok(Vec4::from_slice(cast_window::<f32>(self.bytes, range, name)?))
    }

    pub fn mat3(&self, name: &str) -> Result<Mat3> {
        let range = typed_window_range(self.cursor.slot(name)?, name, Primitive::Mat3x3)?;
        let m = cast_window::<f32>(self.bytes, range, name)?;
        Ok(Mat3::from_cols(
            Vec3::from_slice(&m[0..3]),
            Vec3::from_slice(&m[4..7]),
            Vec3::from_slice(&m[8..11]),
        ))
    }

    pub fn mat4(&self, name: &str) -> Result<Mat4> {
        let range = typed_window_range(self.cursor.slot(name)?, name, Primitive::Mat4x4)?;
        Ok(Mat4::from_cols_slice(cast_window::<f32>(self.bytes, range, name)?))
    }

    /// A nested struct field.
    pub fn field(&self, name: &str) -> Result<View<'a>> {
        let cursor = expect_struct(self.cursor.slot(name)?, name)?;
        Ok(View {
            cursor,
            bytes: self.bytes,
        })
    }

    /// An array field.
    pub fn array(&self, name: &str) -> Result<ArrayView<'a>> {
        match self.cursor.slot(name)? {
            Slot::Array {
                offset,
                element,
                stride,
                len,
            } => Ok(ArrayView {
                name: name.to_string(),
                element,
                offset,
                stride,
                len,
                bytes: self.bytes,
            }),
            other => Err(TesseraError::FieldKindMismatch {
                field: name.to_string(),
                expected: "an array".to_string(),
                found: slot_kind_name(&other),
            }),
        }
    }

    /// Reads the scalar at a field path such as `lights[2].range`.
    pub fn get_path(&self, path: &str) -> Result<f64> {
        read_number(self.bytes, resolve_path(self.cursor, path)?, path)
    }

    pub fn window_path<T: WindowElement>(&self, path: &str) -> Result<&'a [T]> {
        let range = window_range::<T>(resolve_path(self.cursor, path)?, path)?;
        cast_window(self.bytes, range, path)
    }
}

/// Read-only fixed-length sequence of element views.
#[derive(Clone)]
pub struct ArrayView<'a> {
    name: String,
    element: &'a StructLayout,
    offset: usize,
    stride: usize,
    len: usize,
    bytes: &'a [u8],
}

impl<'a> ArrayView<'a> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn get(&self, index: usize) -> Result<View<'a>> {
        if index >= self.len {
            return Err(TesseraError::IndexOutOfRange {
                path: self.name.clone(),
                index,
                len: self.len,
            });
        }
        Ok(View {
            cursor: element_cursor(self.element, self.offset, self.stride, index),
            bytes: self.bytes,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = View<'a>> + '_ {
        (0..self.len).map(move |i| View {
            cursor: element_cursor(self.element, self.offset, self.stride, i),
            bytes: self.bytes,
        })
    }
}

// ============================================================================
// Mutable view
// ============================================================================

/// Read/write view over a struct.
pub struct ViewMut<'a> {
    cursor: Cursor<'a>,
    bytes: &'a mut [u8],
}

impl<'a> ViewMut<'a> {
    /// Builds a view over memory already validated by [`ViewBuilder`].
    pub(crate) fn from_validated(builder: ViewBuilder<'a>, bytes: &'a mut [u8]) -> Self {
        Self {
            cursor: builder.cursor(),
            bytes,
        }
    }

    /// Reborrows as a read-only view.
    #[must_use]
    pub fn as_view(&self) -> View<'_> {
        View {
            cursor: self.cursor,
            bytes: &*self.bytes,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &'a StructLayout {
        self.cursor.layout
    }

    #[must_use]
    pub fn byte_offset(&self) -> usize {
        self.cursor.base
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        self.as_view().get(name)
    }

    pub fn get_f32(&self, name: &str) -> Result<f32> {
        self.as_view().get_f32(name)
    }

    pub fn get_u32(&self, name: &str) -> Result<u32> {
        self.as_view().get_u32(name)
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        self.as_view().get_i32(name)
    }

    pub fn window<T: WindowElement>(&self, name: &str) -> Result<&[T]> {
        let range = window_range::<T>(self.cursor.slot(name)?, name)?;
        cast_window(&*self.bytes, range, name)
    }

    pub fn get_path(&self, path: &str) -> Result<f64> {
        self.as_view().get_path(path)
    }

    /// Writes a number to a scalar field.
    ///
    /// The number is converted to the field's representation: `f32` fields
    /// round, `u32` / `i32` fields truncate and wrap modulo 2^32 (`-1` stored
    /// in a `u32` reads back as `4294967295`). Composite fields cannot be
    /// assigned and yield [`TesseraError::ImmutableWrite`].
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let slot = self.cursor.slot(name)?;
        write_number(self.bytes, slot, name, value)
    }

    pub fn set_f32(&mut self, name: &str, value: f32) -> Result<()> {
        let offset = scalar_offset(self.cursor.slot(name)?, name, ScalarKind::F32)?;
        write_word(self.bytes, offset, value.to_bits());
        Ok(())
    }

    pub fn set_u32(&mut self, name: &str, value: u32) -> Result<()> {
        let offset = scalar_offset(self.cursor.slot(name)?, name, ScalarKind::U32)?;
        write_word(self.bytes, offset, value);
        Ok(())
    }

    pub fn set_i32(&mut self, name: &str, value: i32) -> Result<()> {
        let offset = scalar_offset(self.cursor.slot(name)?, name, ScalarKind::I32)?;
        write_word(self.bytes, offset, value as u32);
        Ok(())
    }

    /// Mutable components of a vector or matrix field. The window has a
    /// fixed length; write through it element-wise.
    pub fn window_mut<T: WindowElement>(&mut self, name: &str) -> Result<&mut [T]> {
        let range = window_range::<T>(self.cursor.slot(name)?, name)?;
        cast_window_mut(self.bytes, range, name)
    }

    fn f32_window_mut(&mut self, name: &str, expected: Primitive) -> Result<&mut [f32]> {
        let range = typed_window_range(self.cursor.slot(name)?, name, expected)?;
        cast_window_mut(self.bytes, range, name)
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) -> Result<()> {
        self.f32_window_mut(name, Primitive::VEC2_F32)?
            .copy_from_slice(&value.to_array());
        Ok(())
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<()> {
        self.f32_window_mut(name, Primitive::VEC3_F32)?
            .copy_from_slice(&value.to_array());
        Ok(())
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) -> Result<()> {
        self.f32_window_mut(name, Primitive::VEC4_F32)?
            .copy_from_slice(&value.to_array());
        Ok(())
    }

    /// Writes a 3x3 matrix as three 16-byte columns, zeroing the padding.
    pub fn set_mat3(&mut self, name: &str, value: Mat3) -> Result<()> {
        let window = self.f32_window_mut(name, Primitive::Mat3x3)?;
        for (column, chunk) in [value.x_axis, value.y_axis, value.z_axis]
            .iter()
            .zip(window.chunks_exact_mut(4))
        {
            chunk.copy_from_slice(&column.extend(0.0).to_array());
        }
        Ok(())
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) -> Result<()> {
        self.f32_window_mut(name, Primitive::Mat4x4)?
            .copy_from_slice(&value.to_cols_array());
        Ok(())
    }

    /// A nested struct field, mutable through its leaves.
    pub fn field_mut(&mut self, name: &str) -> Result<ViewMut<'_>> {
        let cursor = expect_struct(self.cursor.slot(name)?, name)?;
        Ok(ViewMut {
            cursor,
            bytes: &mut *self.bytes,
        })
    }

    pub fn array_mut(&mut self, name: &str) -> Result<ArrayViewMut<'_>> {
        match self.cursor.slot(name)? {
            Slot::Array {
                offset,
                element,
                stride,
                len,
            } => Ok(ArrayViewMut {
                name: name.to_string(),
                element,
                offset,
                stride,
                len,
                bytes: &mut *self.bytes,
            }),
            other => Err(TesseraError::FieldKindMismatch {
                field: name.to_string(),
                expected: "an array".to_string(),
                found: slot_kind_name(&other),
            }),
        }
    }

    /// Writes the scalar at a field path. Paths naming a struct, an array,
    /// an array slot, a vector or a matrix yield
    /// [`TesseraError::ImmutableWrite`].
    pub fn set_path(&mut self, path: &str, value: f64) -> Result<()> {
        let slot = resolve_path(self.cursor, path)?;
        write_number(self.bytes, slot, path, value)
    }

    pub fn window_path_mut<T: WindowElement>(&mut self, path: &str) -> Result<&mut [T]> {
        let range = window_range::<T>(resolve_path(self.cursor, path)?, path)?;
        cast_window_mut(self.bytes, range, path)
    }
}

/// Mutable fixed-length sequence of element views.
pub struct ArrayViewMut<'a> {
    name: String,
    element: &'a StructLayout,
    offset: usize,
    stride: usize,
    len: usize,
    bytes: &'a mut [u8],
}

impl ArrayViewMut<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn get(&self, index: usize) -> Result<View<'_>> {
        self.check(index)?;
        Ok(View {
            cursor: element_cursor(self.element, self.offset, self.stride, index),
            bytes: &*self.bytes,
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<ViewMut<'_>> {
        self.check(index)?;
        Ok(ViewMut {
            cursor: element_cursor(self.element, self.offset, self.stride, index),
            bytes: &mut *self.bytes,
        })
    }

    /// Visits every element in order, stopping at the first error.
    pub fn try_for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(usize, ViewMut<'_>) -> Result<()>,
    {
        for i in 0..self.len {
            let view = ViewMut {
                cursor: element_cursor(self.element, self.offset, self.stride, i),
                bytes: &mut *self.bytes,
            };
            f(i, view)?;
        }
        Ok(())
    }

    fn check(&self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(TesseraError::IndexOutOfRange {
                path: self.name.clone(),
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}
