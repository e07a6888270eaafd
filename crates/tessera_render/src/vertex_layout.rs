//! Vertex Layout Builder
//!
//! Turns per-vertex-buffer struct descriptors into `wgpu` vertex buffer
//! layouts and a merged WGSL vertex-input struct.
//!
//! Vertex data is tightly packed: each attribute starts right after the
//! previous one, and the stride is the plain sum of attribute sizes unless a
//! stride alignment is requested. Shader locations are numbered across all
//! buffers in order and never restart.

use std::fmt::Write;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tessera_core::descriptor::{ArrayLength, FieldType, Primitive, ScalarKind, StructDescriptor};
use tessera_core::errors::{LayoutError, Result};
use tessera_core::layout::{Packing, align_up};
use wgpu::VertexFormat;

use crate::settings::EmitterSettings;

/// One attribute of a vertex buffer, before locations are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexField {
    pub name: String,
    pub offset: u64,
    pub primitive: Primitive,
    pub format: VertexFormat,
}

/// The vertex format for a primitive, if it can be a vertex attribute.
#[must_use]
pub fn vertex_format(primitive: Primitive) -> Option<VertexFormat> {
    use ScalarKind::{F32, I32, U32};

    Some(match primitive {
        Primitive::Scalar(F32) => VertexFormat::Float32,
        Primitive::Vec2(F32) => VertexFormat::Float32x2,
        Primitive::Vec3(F32) => VertexFormat::Float32x3,
        Primitive::Vec4(F32) => VertexFormat::Float32x4,
        Primitive::Scalar(U32) => VertexFormat::Uint32,
        Primitive::Vec2(U32) => VertexFormat::Uint32x2,
        Primitive::Vec3(U32) => VertexFormat::Uint32x3,
        Primitive::Vec4(U32) => VertexFormat::Uint32x4,
        Primitive::Scalar(I32) => VertexFormat::Sint32,
        Primitive::Vec2(I32) => VertexFormat::Sint32x2,
        Primitive::Vec3(I32) => VertexFormat::Sint32x3,
        Primitive::Vec4(I32) => VertexFormat::Sint32x4,
        Primitive::Mat3x3 | Primitive::Mat4x4 => return None,
    })
}

// ============================================================================
// Per-buffer layout
// ============================================================================

/// Layout of one vertex buffer described by a struct.
#[derive(Debug, Clone)]
pub struct VertexBufferLayout {
    descriptor: Arc<StructDescriptor>,
    step_mode: wgpu::VertexStepMode,
    packed_size: u64,
    stride: u64,
    fields: SmallVec<[VertexField; 8]>,
}

impl VertexBufferLayout {
    /// A per-vertex buffer. Every field must be a scalar or vector.
    pub fn new(descriptor: impl Into<Arc<StructDescriptor>>) -> Result<Self> {
        let descriptor = descriptor.into();
        let layout = descriptor.layout(Packing::Tight)?;

        let mut fields = SmallVec::new();
        for (field, (name, ty)) in layout.fields().iter().zip(descriptor.fields()) {
            let primitive = match ty {
                FieldType::Primitive(p) => *p,
                FieldType::Struct(_) => return Err(unsupported(name, "struct").into()),
                FieldType::Array {
                    length: ArrayLength::Fixed(n),
                    ..
                } => return Err(unsupported(name, &format!("array of {n}")).into()),
                FieldType::Array { .. } => return Err(unsupported(name, "runtime-sized array").into()),
            };
            let format = vertex_format(primitive).ok_or_else(|| unsupported(name, primitive.wgsl_name()))?;
            fields.push(VertexField {
                name: name.to_string(),
                offset: field.offset as u64,
                primitive,
                format,
            });
        }

        let packed_size = layout.size() as u64;
        Ok(Self {
            descriptor,
            step_mode: wgpu::VertexStepMode::Vertex,
            packed_size,
            stride: packed_size,
            fields,
        })
    }

    /// A per-instance buffer.
    pub fn instanced(descriptor: impl Into<Arc<StructDescriptor>>) -> Result<Self> {
        Ok(Self::new(descriptor)?.with_step_mode(wgpu::VertexStepMode::Instance))
    }

    #[must_use]
    pub fn with_step_mode(mut self, step_mode: wgpu::VertexStepMode) -> Self {
        self.step_mode = step_mode;
        self
    }

    /// Pads the stride up to a multiple of `align` bytes. Offsets are unchanged.
    #[must_use]
    pub fn with_stride_alignment(mut self, align: u64) -> Self {
        if align > 1 {
            self.stride = align_up(self.packed_size as usize, align as usize) as u64;
        }
        self
    }

    #[must_use]
    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    #[must_use]
    pub fn step_mode(&self) -> wgpu::VertexStepMode {
        self.step_mode
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    #[must_use]
    pub fn fields(&self) -> &[VertexField] {
        &self.fields
    }
}

fn unsupported(field: &str, ty: &str) -> LayoutError {
    LayoutError::UnsupportedVertexAttribute {
        field: field.to_string(),
        ty: ty.to_string(),
    }
}

// ============================================================================
// Merged layout
// ============================================================================

/// Owned counterpart of `wgpu::VertexBufferLayout`.
#[derive(Debug, Clone)]
pub struct OwnedVertexBufferDesc {
    pub array_stride: u64,
    pub step_mode: wgpu::VertexStepMode,
    pub attributes: SmallVec<[wgpu::VertexAttribute; 8]>,
}

impl OwnedVertexBufferDesc {
    #[must_use]
    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: &self.attributes,
        }
    }
}

/// Vertex buffer layouts of a pipeline plus the WGSL vertex-input struct.
#[derive(Debug, Clone)]
pub struct VertexLayout {
    buffers: Vec<OwnedVertexBufferDesc>,
    shader_code: String,
    locations: FxHashMap<String, u32>,
}

impl VertexLayout {
    pub fn new(buffers: impl IntoIterator<Item = VertexBufferLayout>) -> Result<Self> {
        Self::with_settings(buffers, &EmitterSettings::default())
    }

    /// Assigns shader locations in buffer order, then field order.
    pub fn with_settings(
        buffers: impl IntoIterator<Item = VertexBufferLayout>,
        settings: &EmitterSettings,
    ) -> Result<Self> {
        let mut owned = Vec::new();
        let mut locations = FxHashMap::default();
        let mut body = String::new();
        let mut next_location = 0u32;

        for buffer in buffers {
            let mut attributes = SmallVec::new();
            for field in buffer.fields() {
                let location = next_location;
                next_location += 1;

                if locations.insert(field.name.clone(), location).is_some() {
                    return Err(LayoutError::DuplicateField {
                        path: settings.vertex_input_name.clone(),
                        field: field.name.clone(),
                    }
                    .into());
                }
                attributes.push(wgpu::VertexAttribute {
                    format: field.format,
                    offset: field.offset,
                    shader_location: location,
                });
                let _ = writeln!(
                    body,
                    "{}@location({location}) {}: {},",
                    settings.indent,
                    field.name,
                    field.primitive.wgsl_name()
                );
            }

            owned.push(OwnedVertexBufferDesc {
                array_stride: buffer.stride(),
                step_mode: buffer.step_mode(),
                attributes,
            });
        }

        if next_location == 0 {
            return Err(LayoutError::EmptyStruct {
                path: settings.vertex_input_name.clone(),
            }
            .into());
        }
        let shader_code = format!("struct {} {{\n{body}}};", settings.vertex_input_name);

        log::debug!(
            "Vertex layout: {} buffers, strides {:?}, {next_location} locations",
            owned.len(),
            owned.iter().map(|b| b.array_stride).collect::<Vec<_>>()
        );

        Ok(Self {
            buffers: owned,
            shader_code,
            locations,
        })
    }

    #[must_use]
    pub fn buffers(&self) -> &[OwnedVertexBufferDesc] {
        &self.buffers
    }

    /// Layouts for `wgpu::VertexState::buffers`.
    #[must_use]
    pub fn buffer_layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.buffers.iter().map(OwnedVertexBufferDesc::as_wgpu).collect()
    }

    /// The merged vertex-input struct declaration.
    #[must_use]
    pub fn shader_code(&self) -> &str {
        &self.shader_code
    }

    #[must_use]
    pub fn location(&self, attribute: &str) -> Option<u32> {
        self.locations.get(attribute).copied()
    }

    #[must_use]
    pub fn locations(&self) -> &FxHashMap<String, u32> {
        &self.locations
    }
}
