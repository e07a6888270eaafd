//! Size / Alignment Calculator
//!
//! Derives byte-exact offsets, sizes and alignments for a
//! [`StructDescriptor`]. The rules follow the WGSL host-shareable layout:
//!
//! - a primitive has a fixed `(size, align)` (see [`Primitive`]);
//! - an array's alignment is its element's alignment, its stride is the
//!   element size (already padded to the element alignment);
//! - a struct's alignment is the maximum member alignment, each member sits
//!   at the next multiple of its own alignment, and the total size is rounded
//!   up to the struct alignment.
//!
//! [`Packing::Tight`] treats every alignment as 1, which yields the running
//! sum of raw field sizes used for vertex attribute data.
//!
//! Layouts are computed once per descriptor instance and packing mode and
//! shared as `Arc<StructLayout>`.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::descriptor::{ArrayLength, FieldType, Primitive, StructDescriptor, is_wgsl_identifier};
use crate::errors::{LayoutError, Result, TesseraError};

/// Alignment regime used when laying out a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Packing {
    /// Host-shareable rules for uniform and storage buffers.
    #[default]
    Standard,
    /// No alignment padding at all.
    Tight,
}

impl Packing {
    #[inline]
    fn align_of(self, natural: usize) -> usize {
        match self {
            Packing::Standard => natural,
            Packing::Tight => 1,
        }
    }
}

/// Rounds `x` up to the next multiple of `align`.
#[inline]
#[must_use]
pub const fn align_up(x: usize, align: usize) -> usize {
    let rem = x % align;
    if rem == 0 { x } else { x + (align - rem) }
}

/// [`align_up`] that reports overflow instead of wrapping.
#[inline]
fn checked_align_up(x: usize, align: usize) -> Option<usize> {
    let rem = x % align;
    if rem == 0 { Some(x) } else { x.checked_add(align - rem) }
}

// ============================================================================
// Layout tables
// ============================================================================

/// The resolved kind of a laid-out field.
#[derive(Debug, Clone)]
pub enum FieldLayoutKind {
    Primitive(Primitive),
    Array {
        element: Arc<StructLayout>,
        length: ArrayLength,
        /// Byte distance between consecutive elements.
        stride: usize,
    },
    Struct(Arc<StructLayout>),
}

/// Placement of one field relative to the start of its struct.
#[derive(Debug, Clone)]
pub struct FieldLayout {
    pub name: String,
    pub offset: usize,
    /// For runtime-sized arrays this is 0 (no elements counted).
    pub size: usize,
    pub align: usize,
    pub kind: FieldLayoutKind,
}

/// Location of the runtime-sized array that terminates an unsized struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeTail {
    /// Offset of the first element, relative to the struct start.
    pub offset: usize,
    pub stride: usize,
}

/// Computed layout of a struct: the offset table shared by views and the
/// WGSL emitter.
#[derive(Debug, Clone)]
pub struct StructLayout {
    fields: Vec<FieldLayout>,
    index: FxHashMap<String, usize>,
    size: usize,
    align: usize,
    packing: Packing,
    tail: Option<RuntimeTail>,
}

impl StructLayout {
    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Total size in bytes, rounded up to [`Self::align`]. For an unsized
    /// struct this counts zero runtime elements.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn align(&self) -> usize {
        self.align
    }

    #[must_use]
    pub fn packing(&self) -> Packing {
        self.packing
    }

    /// `false` if the struct ends in a runtime-sized array.
    #[must_use]
    pub fn is_sized(&self) -> bool {
        self.tail.is_none()
    }

    #[must_use]
    pub fn runtime_tail(&self) -> Option<RuntimeTail> {
        self.tail
    }

    /// Size in bytes when the trailing runtime array holds `runtime_len`
    /// elements. Equal to [`Self::size`] for sized structs.
    ///
    /// Fails with [`LayoutError::SizeOverflow`] if the size does not fit in
    /// `usize`.
    pub fn size_for(&self, runtime_len: usize) -> Result<usize> {
        let Some(tail) = self.tail else {
            return Ok(self.size);
        };
        runtime_len
            .checked_mul(tail.stride)
            .and_then(|bytes| bytes.checked_add(tail.offset))
            .and_then(|end| checked_align_up(end, self.align))
            .ok_or_else(|| overflow(""))
    }
}

// ============================================================================
// Calculator
// ============================================================================

impl StructDescriptor {
    /// Computes (or returns the cached) layout of this struct.
    ///
    /// Fails with [`LayoutError`] if this struct or any nested struct is
    /// empty, has duplicate or invalid field names, declares a zero-length
    /// array, or misplaces a runtime-sized array.
    pub fn layout(&self, packing: Packing) -> Result<Arc<StructLayout>> {
        self.layout_at(packing, "")
    }

    /// Size in bytes under the standard rules.
    pub fn size(&self) -> Result<usize> {
        Ok(self.layout(Packing::Standard)?.size())
    }

    /// Alignment in bytes under the standard rules.
    pub fn align(&self) -> Result<usize> {
        Ok(self.layout(Packing::Standard)?.align())
    }

    fn layout_at(&self, packing: Packing, path: &str) -> Result<Arc<StructLayout>> {
        let cache = match packing {
            Packing::Standard => &self.standard_layout,
            Packing::Tight => &self.tight_layout,
        };
        if let Some(layout) = cache.get() {
            return Ok(layout.clone());
        }

        let layout = Arc::new(compute_struct(self, packing, path)?);
        log::trace!(
            "Computed {:?} layout for `{}`: size {} align {}",
            packing,
            display_path(path),
            layout.size,
            layout.align
        );
        Ok(cache.get_or_init(|| layout).clone())
    }
}

/// `(size, align)` of a single field type.
///
/// Runtime-sized arrays report a size of 0.
pub fn size_align(ty: &FieldType, packing: Packing) -> Result<(usize, usize)> {
    let (size, align, _) = resolve_field(ty, packing, "")?;
    Ok((size, align))
}

fn compute_struct(desc: &StructDescriptor, packing: Packing, path: &str) -> Result<StructLayout> {
    if desc.is_empty() {
        return Err(LayoutError::EmptyStruct {
            path: display_path(path),
        }
        .into());
    }

    let count = desc.len();
    let mut fields = Vec::with_capacity(count);
    let mut index = FxHashMap::default();
    let mut cursor = 0;
    let mut struct_align = 1;
    let mut tail = None;

    for (i, (name, ty)) in desc.fields().enumerate() {
        if !is_wgsl_identifier(name) {
            return Err(LayoutError::InvalidFieldName {
                path: display_path(path),
                field: name.to_string(),
            }
            .into());
        }
        if index.insert(name.to_string(), i).is_some() {
            return Err(LayoutError::DuplicateField {
                path: display_path(path),
                field: name.to_string(),
            }
            .into());
        }

        let field_path = join_path(path, name);
        let (size, align, kind) = resolve_field(ty, packing, &field_path)?;
        let offset = checked_align_up(cursor, align).ok_or_else(|| overflow(&field_path))?;

        if let Some(inner) = unsized_tail(&kind) {
            if i + 1 != count {
                return Err(LayoutError::RuntimeArrayNotLast { path: field_path }.into());
            }
            tail = Some(RuntimeTail {
                offset: offset + inner.offset,
                stride: inner.stride,
            });
        }

        cursor = offset.checked_add(size).ok_or_else(|| overflow(&field_path))?;
        struct_align = struct_align.max(align);
        fields.push(FieldLayout {
            name: name.to_string(),
            offset,
            size,
            align,
            kind,
        });
    }

    let size = checked_align_up(cursor, struct_align).ok_or_else(|| overflow(path))?;
    Ok(StructLayout {
        fields,
        index,
        size,
        align: struct_align,
        packing,
        tail,
    })
}

fn resolve_field(ty: &FieldType, packing: Packing, path: &str) -> Result<(usize, usize, FieldLayoutKind)> {
    match ty {
        FieldType::Primitive(p) => Ok((p.size(), packing.align_of(p.align()), FieldLayoutKind::Primitive(*p))),
        FieldType::Struct(desc) => {
            let layout = desc.layout_at(packing, path)?;
            Ok((layout.size(), layout.align(), FieldLayoutKind::Struct(layout)))
        }
        FieldType::Array { element, length } => {
            let element_path = format!("{path}[]");
            let layout = element.layout_at(packing, &element_path)?;
            if !layout.is_sized() {
                return Err(LayoutError::UnsizedArrayElement { path: path.to_string() }.into());
            }
            let stride = layout.size();
            let size = match *length {
                ArrayLength::Fixed(0) => {
                    return Err(LayoutError::ZeroLengthArray { path: path.to_string() }.into());
                }
                ArrayLength::Fixed(n) => stride.checked_mul(n).ok_or_else(|| overflow(path))?,
                ArrayLength::Runtime => 0,
            };
            let align = layout.align();
            Ok((
                size,
                align,
                FieldLayoutKind::Array {
                    element: layout,
                    length: *length,
                    stride,
                },
            ))
        }
    }
}

/// The runtime tail a field contributes, relative to the field's offset.
fn unsized_tail(kind: &FieldLayoutKind) -> Option<RuntimeTail> {
    match kind {
        FieldLayoutKind::Array {
            length: ArrayLength::Runtime,
            stride,
            ..
        } => Some(RuntimeTail {
            offset: 0,
            stride: *stride,
        }),
        FieldLayoutKind::Struct(inner) => inner.runtime_tail(),
        _ => None,
    }
}

fn overflow(path: &str) -> TesseraError {
    LayoutError::SizeOverflow {
        path: display_path(path),
    }
    .into()
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
