//! WGSL Declaration Emitter
//!
//! Generates WGSL `struct` blocks and `@group/@binding` lines from the same
//! struct descriptors that drive CPU-side views, so the shader's idea of a
//! buffer can never drift from the bytes the host writes.
//!
//! # Naming
//!
//! Nested structs are synthesized on the fly. A struct field `lights` of the
//! root struct `S_globalLights` is declared as `S_globalLights_lights`, at
//! every depth, and always before the struct that uses it:
//!
//! ```wgsl
//! struct S_globalLights_lights {
//!   position: vec3<f32>,
//!   range: f32,
//! };
//! struct S_globalLights {
//!   lightCount: u32,
//!   lights: array<S_globalLights_lights, 4>,
//! };
//! ```
//!
//! Every struct name must be unique within one emission, so a field named
//! `a_b` next to a struct field `a` with a member `b` is rejected with
//! [`LayoutError::DuplicateStructName`].
//!
//! Emission is pure string building; nothing is cached.

use std::fmt::Write;

use rustc_hash::FxHashSet;
use tessera_core::descriptor::{ArrayLength, FieldType, StructDescriptor};
use tessera_core::errors::{LayoutError, Result};
use tessera_core::layout::Packing;

use crate::backend::ResolvedEntry;
use crate::binding::{BindingEntry, BindingType};
use crate::settings::EmitterSettings;

/// Struct blocks and binding lines for one bind group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDeclarations {
    /// Struct blocks joined by newlines; empty when the group has no buffers.
    pub structs: String,
    /// One `@group(..) @binding(..) var ...;` line per entry.
    pub bindings: Vec<String>,
}

/// Emits WGSL declarations according to [`EmitterSettings`].
#[derive(Debug, Clone, Default)]
pub struct ShaderDeclEmitter {
    settings: EmitterSettings,
}

impl ShaderDeclEmitter {
    #[must_use]
    pub fn new(settings: EmitterSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    /// Declares `desc` as a struct called `name`, preceded by every nested
    /// struct it needs. Blocks are separated by a single newline and the
    /// text has no trailing newline.
    pub fn emit_struct(&self, name: &str, desc: &StructDescriptor) -> Result<String> {
        self.emit_struct_into(name, desc, &mut FxHashSet::default())
    }

    fn emit_struct_into(
        &self,
        name: &str,
        desc: &StructDescriptor,
        declared: &mut FxHashSet<String>,
    ) -> Result<String> {
        desc.layout(Packing::Standard)?;

        let mut blocks = Vec::new();
        self.collect_struct(name, desc, &mut blocks, declared)?;
        Ok(blocks.join("\n"))
    }

    fn collect_struct(
        &self,
        name: &str,
        desc: &StructDescriptor,
        blocks: &mut Vec<String>,
        declared: &mut FxHashSet<String>,
    ) -> std::result::Result<(), LayoutError> {
        if !declared.insert(name.to_string()) {
            return Err(LayoutError::DuplicateStructName { name: name.to_string() });
        }

        let mut body = String::new();
        for (field, ty) in desc.fields() {
            let type_name = match ty {
                FieldType::Primitive(p) => p.wgsl_name().to_string(),
                FieldType::Struct(inner) => {
                    let inner_name = format!("{name}_{field}");
                    self.collect_struct(&inner_name, inner, blocks, declared)?;
                    inner_name
                }
                FieldType::Array { element, length } => {
                    let element_name = format!("{name}_{field}");
                    self.collect_struct(&element_name, element, blocks, declared)?;
                    match length {
                        ArrayLength::Fixed(n) => format!("array<{element_name}, {n}>"),
                        ArrayLength::Runtime => format!("array<{element_name}>"),
                    }
                }
            };
            let _ = writeln!(body, "{}{field}: {type_name},", self.settings.indent);
        }
        blocks.push(format!("struct {name} {{\n{body}}};"));
        Ok(())
    }

    /// One binding declaration line.
    ///
    /// Buffers reference the struct named by [`EmitterSettings::struct_name`];
    /// other kinds use their fixed WGSL type.
    pub fn emit_binding_decl(&self, group: u32, binding: u32, name: &str, entry: &BindingEntry) -> Result<String> {
        self.binding_line(group, binding, name, &entry.ty)
    }

    fn binding_line(&self, group: u32, binding: u32, name: &str, ty: &BindingType) -> Result<String> {
        let prefix = format!("@group({group}) @binding({binding})");
        Ok(match ty {
            BindingType::Buffer { access, .. } => format!(
                "{prefix} var<{}> {name}: {};",
                access.address_space(),
                self.settings.struct_name(name)
            ),
            other => format!("{prefix} var {name}: {};", resource_type_name(name, other)?),
        })
    }

    /// Struct blocks and binding lines for one group of resolved entries.
    /// Struct names must be unique across the whole group.
    pub fn emit_group(&self, group: u32, entries: &[ResolvedEntry]) -> Result<GroupDeclarations> {
        let mut structs = Vec::new();
        let mut bindings = Vec::with_capacity(entries.len());
        let mut declared = FxHashSet::default();

        for entry in entries {
            if let BindingType::Buffer { layout, .. } = &entry.ty {
                structs.push(self.emit_struct_into(&self.settings.struct_name(&entry.name), layout, &mut declared)?);
            }
            bindings.push(self.binding_line(group, entry.binding, &entry.name, &entry.ty)?);
        }

        Ok(GroupDeclarations {
            structs: structs.join("\n"),
            bindings,
        })
    }
}

/// [`ShaderDeclEmitter::emit_struct`] with default settings.
pub fn emit_struct(name: &str, desc: &StructDescriptor) -> Result<String> {
    ShaderDeclEmitter::default().emit_struct(name, desc)
}

/// [`ShaderDeclEmitter::emit_binding_decl`] with default settings.
pub fn emit_binding_decl(group: u32, binding: u32, name: &str, entry: &BindingEntry) -> Result<String> {
    ShaderDeclEmitter::default().emit_binding_decl(group, binding, name, entry)
}

// ============================================================================
// Non-buffer type names
// ============================================================================

fn unsupported(name: &str, reason: String) -> LayoutError {
    LayoutError::UnsupportedBinding {
        name: name.to_string(),
        reason,
    }
}

fn resource_type_name(name: &str, ty: &BindingType) -> std::result::Result<String, LayoutError> {
    match ty {
        BindingType::Buffer { .. } => Err(unsupported(name, "buffers have no fixed type name".to_string())),
        BindingType::Sampler(wgpu::SamplerBindingType::Comparison) => Ok("sampler_comparison".to_string()),
        BindingType::Sampler(_) => Ok("sampler".to_string()),
        BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled,
        } => texture_type_name(*sample_type, *view_dimension, *multisampled)
            .ok_or_else(|| unsupported(name, format!("{view_dimension:?} texture of {sample_type:?}"))),
        BindingType::StorageTexture {
            access,
            format,
            view_dimension,
        } => {
            let dim = match view_dimension {
                wgpu::TextureViewDimension::D1 => "1d",
                wgpu::TextureViewDimension::D2 => "2d",
                wgpu::TextureViewDimension::D2Array => "2d_array",
                wgpu::TextureViewDimension::D3 => "3d",
                other => return Err(unsupported(name, format!("{other:?} storage texture"))),
            };
            let access = match access {
                wgpu::StorageTextureAccess::WriteOnly => "write",
                wgpu::StorageTextureAccess::ReadOnly => "read",
                wgpu::StorageTextureAccess::ReadWrite => "read_write",
                #[allow(unreachable_patterns)]
                other => return Err(unsupported(name, format!("{other:?} storage access"))),
            };
            let texel = storage_format_name(*format).ok_or_else(|| LayoutError::UnsupportedStorageFormat {
                name: name.to_string(),
                format: format!("{format:?}"),
            })?;
            Ok(format!("texture_storage_{dim}<{texel}, {access}>"))
        }
        BindingType::ExternalTexture => Ok("texture_external".to_string()),
    }
}

fn texture_type_name(
    sample_type: wgpu::TextureSampleType,
    view_dimension: wgpu::TextureViewDimension,
    multisampled: bool,
) -> Option<String> {
    use wgpu::TextureViewDimension as D;

    let texel = match sample_type {
        wgpu::TextureSampleType::Float { .. } => "f32",
        wgpu::TextureSampleType::Sint => "i32",
        wgpu::TextureSampleType::Uint => "u32",
        wgpu::TextureSampleType::Depth => {
            let name = match (view_dimension, multisampled) {
                (D::D2, false) => "texture_depth_2d",
                (D::D2Array, false) => "texture_depth_2d_array",
                (D::Cube, false) => "texture_depth_cube",
                (D::CubeArray, false) => "texture_depth_cube_array",
                (D::D2, true) => "texture_depth_multisampled_2d",
                _ => return None,
            };
            return Some(name.to_string());
        }
        #[allow(unreachable_patterns)]
        _ => return None,
    };

    let shape = match (view_dimension, multisampled) {
        (D::D1, false) => "texture_1d",
        (D::D2, false) => "texture_2d",
        (D::D2Array, false) => "texture_2d_array",
        (D::Cube, false) => "texture_cube",
        (D::CubeArray, false) => "texture_cube_array",
        (D::D3, false) => "texture_3d",
        (D::D2, true) => "texture_multisampled_2d",
        _ => return None,
    };
    Some(format!("{shape}<{texel}>"))
}

#[allow(clippy::match_same_arms)]
fn storage_format_name(format: wgpu::TextureFormat) -> Option<&'static str> {
    use wgpu::TextureFormat as F;

    Some(match format {
        F::Rgba8Unorm => "rgba8unorm",
        F::Rgba8Snorm => "rgba8snorm",
        F::Rgba8Uint => "rgba8uint",
        F::Rgba8Sint => "rgba8sint",
        F::Bgra8Unorm => "bgra8unorm",
        F::Rgba16Uint => "rgba16uint",
        F::Rgba16Sint => "rgba16sint",
        F::Rgba16Float => "rgba16float",
        F::R32Uint => "r32uint",
        F::R32Sint => "r32sint",
        F::R32Float => "r32float",
        F::Rg32Uint => "rg32uint",
        F::Rg32Sint => "rg32sint",
        F::Rg32Float => "rg32float",
        F::Rgba32Uint => "rgba32uint",
        F::Rgba32Sint => "rgba32sint",
        F::Rgba32Float => "rgba32float",
        _ => return None,
    })
}
