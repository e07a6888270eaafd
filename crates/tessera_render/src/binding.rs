//! Binding entries.
//!
//! A [`BindingEntry`] declares one slot of a bind group layout: which shader
//! stages see it, which binding index it occupies (explicit or assigned in
//! declaration order), and what kind of resource it expects.

use std::num::NonZeroU64;
use std::sync::Arc;

use tessera_core::descriptor::StructDescriptor;
use tessera_core::errors::{LayoutError, Result};
use tessera_core::layout::{FieldLayoutKind, Packing, StructLayout};
use tessera_core::resource::ResourceKind;
use wgpu::ShaderStages;

/// Address space and access mode of a buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferAccess {
    /// `var<uniform>`
    Uniform,
    /// `var<storage, read>`
    ReadOnlyStorage,
    /// `var<storage, read_write>`
    #[default]
    Storage,
}

impl BufferAccess {
    /// The WGSL address-space annotation, without the angle brackets.
    #[must_use]
    pub const fn address_space(self) -> &'static str {
        match self {
            BufferAccess::Uniform => "uniform",
            BufferAccess::ReadOnlyStorage => "storage, read",
            BufferAccess::Storage => "storage, read_write",
        }
    }

    #[must_use]
    pub const fn as_wgpu(self) -> wgpu::BufferBindingType {
        match self {
            BufferAccess::Uniform => wgpu::BufferBindingType::Uniform,
            BufferAccess::ReadOnlyStorage => wgpu::BufferBindingType::Storage { read_only: true },
            BufferAccess::Storage => wgpu::BufferBindingType::Storage { read_only: false },
        }
    }
}

/// The resource a binding expects.
#[derive(Debug, Clone)]
pub enum BindingType {
    Buffer {
        access: BufferAccess,
        /// Shape of the bound data; drives the emitted struct and the
        /// minimum binding size.
        layout: Arc<StructDescriptor>,
        has_dynamic_offset: bool,
    },
    Sampler(wgpu::SamplerBindingType),
    Texture {
        sample_type: wgpu::TextureSampleType,
        view_dimension: wgpu::TextureViewDimension,
        multisampled: bool,
    },
    StorageTexture {
        access: wgpu::StorageTextureAccess,
        format: wgpu::TextureFormat,
        view_dimension: wgpu::TextureViewDimension,
    },
    ExternalTexture,
}

impl BindingType {
    #[must_use]
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            BindingType::Buffer { .. } => ResourceKind::Buffer,
            BindingType::Sampler(_) => ResourceKind::Sampler,
            BindingType::Texture { .. } => ResourceKind::Texture,
            BindingType::StorageTexture { .. } => ResourceKind::StorageTexture,
            BindingType::ExternalTexture => ResourceKind::ExternalTexture,
        }
    }
}

/// One entry of a bind group layout.
#[derive(Debug, Clone)]
pub struct BindingEntry {
    pub visibility: ShaderStages,
    /// Explicit binding index. `None` takes the next free index in
    /// declaration order.
    pub binding: Option<u32>,
    pub ty: BindingType,
}

impl BindingEntry {
    #[must_use]
    pub fn buffer(visibility: ShaderStages, access: BufferAccess, layout: impl Into<Arc<StructDescriptor>>) -> Self {
        Self {
            visibility,
            binding: None,
            ty: BindingType::Buffer {
                access,
                layout: layout.into(),
                has_dynamic_offset: false,
            },
        }
    }

    #[must_use]
    pub fn uniform(visibility: ShaderStages, layout: impl Into<Arc<StructDescriptor>>) -> Self {
        Self::buffer(visibility, BufferAccess::Uniform, layout)
    }

    #[must_use]
    pub fn storage(visibility: ShaderStages, layout: impl Into<Arc<StructDescriptor>>) -> Self {
        Self::buffer(visibility, BufferAccess::Storage, layout)
    }

    #[must_use]
    pub fn read_only_storage(visibility: ShaderStages, layout: impl Into<Arc<StructDescriptor>>) -> Self {
        Self::buffer(visibility, BufferAccess::ReadOnlyStorage, layout)
    }

    #[must_use]
    pub fn sampler(visibility: ShaderStages, ty: wgpu::SamplerBindingType) -> Self {
        Self {
            visibility,
            binding: None,
            ty: BindingType::Sampler(ty),
        }
    }

    #[must_use]
    pub fn texture(
        visibility: ShaderStages,
        sample_type: wgpu::TextureSampleType,
        view_dimension: wgpu::TextureViewDimension,
    ) -> Self {
        Self {
            visibility,
            binding: None,
            ty: BindingType::Texture {
                sample_type,
                view_dimension,
                multisampled: false,
            },
        }
    }

    #[must_use]
    pub fn storage_texture(
        visibility: ShaderStages,
        access: wgpu::StorageTextureAccess,
        format: wgpu::TextureFormat,
        view_dimension: wgpu::TextureViewDimension,
    ) -> Self {
        Self {
            visibility,
            binding: None,
            ty: BindingType::StorageTexture {
                access,
                format,
                view_dimension,
            },
        }
    }

    #[must_use]
    pub fn external_texture(visibility: ShaderStages) -> Self {
        Self {
            visibility,
            binding: None,
            ty: BindingType::ExternalTexture,
        }
    }

    /// Pins the entry to an explicit binding index.
    #[must_use]
    pub fn with_binding(mut self, binding: u32) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Marks a buffer entry as using dynamic offsets. No effect on other kinds.
    #[must_use]
    pub fn with_dynamic_offset(mut self) -> Self {
        if let BindingType::Buffer {
            has_dynamic_offset, ..
        } = &mut self.ty
        {
            *has_dynamic_offset = true;
        }
        self
    }

    /// Marks a texture entry as multisampled. No effect on other kinds.
    #[must_use]
    pub fn multisampled(mut self) -> Self {
        if let BindingType::Texture { multisampled, .. } = &mut self.ty {
            *multisampled = true;
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn resource_kind(&self) -> ResourceKind {
        self.ty.resource_kind()
    }

    /// Checks the entry's struct (if any) and returns the minimum binding
    /// size the layout requires.
    pub(crate) fn validate(&self, name: &str) -> Result<Option<NonZeroU64>> {
        let BindingType::Buffer { access, layout, .. } = &self.ty else {
            return Ok(None);
        };
        let struct_layout = layout.layout(Packing::Standard)?;
        if *access == BufferAccess::Uniform {
            check_uniform(name, &struct_layout, "")?;
        }
        Ok(NonZeroU64::new(struct_layout.size() as u64))
    }
}

fn uniform_violation(name: &str, path: &str, reason: String) -> LayoutError {
    LayoutError::UniformConstraint {
        name: name.to_string(),
        path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
        reason,
    }
}

/// Uniform address space rules on top of the host-shareable layout.
fn check_uniform(name: &str, layout: &StructLayout, prefix: &str) -> std::result::Result<(), LayoutError> {
    if !layout.is_sized() {
        return Err(uniform_violation(
            name,
            prefix,
            "runtime-sized arrays are not allowed in uniform buffers".to_string(),
        ));
    }

    for field in layout.fields() {
        let path = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldLayoutKind::Primitive(_) => {}
            FieldLayoutKind::Struct(inner) => {
                if field.offset % 16 != 0 {
                    return Err(uniform_violation(
                        name,
                        &path,
                        format!("struct member at offset {} is not 16-byte aligned", field.offset),
                    ));
                }
                check_uniform(name, inner, &path)?;
            }
            FieldLayoutKind::Array { element, stride, .. } => {
                if field.offset % 16 != 0 {
                    return Err(uniform_violation(
                        name,
                        &path,
                        format!("array member at offset {} is not 16-byte aligned", field.offset),
                    ));
                }
                if stride % 16 != 0 {
                    return Err(uniform_violation(
                        name,
                        &path,
                        format!("array stride {stride} is not a multiple of 16"),
                    ));
                }
                check_uniform(name, element, &format!("{path}[]"))?;
            }
        }
    }
    Ok(())
}
