//! wgpu implementation of [`BindingBackend`].

use tessera_core::errors::{Result, TesseraError};
use tessera_core::resource::ResourceKind;

use crate::backend::{BindingBackend, BindingResource, ResolvedEntry};
use crate::binding::BindingType;

/// A wgpu resource tagged with its binding kind.
#[derive(Debug, Clone)]
pub enum WgpuResource {
    /// A buffer region. `size: None` binds from `offset` to the end.
    Buffer {
        buffer: wgpu::Buffer,
        offset: u64,
        size: Option<wgpu::BufferSize>,
    },
    Sampler(wgpu::Sampler),
    TextureView(wgpu::TextureView),
    StorageTextureView(wgpu::TextureView),
}

impl WgpuResource {
    /// The whole buffer.
    #[must_use]
    pub fn buffer(buffer: &wgpu::Buffer) -> Self {
        WgpuResource::Buffer {
            buffer: buffer.clone(),
            offset: 0,
            size: None,
        }
    }

    #[must_use]
    pub fn buffer_region(buffer: &wgpu::Buffer, offset: u64, size: u64) -> Self {
        WgpuResource::Buffer {
            buffer: buffer.clone(),
            offset,
            size: wgpu::BufferSize::new(size),
        }
    }

    fn as_binding(&self) -> wgpu::BindingResource<'_> {
        match self {
            WgpuResource::Buffer { buffer, offset, size } => wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: *offset,
                size: *size,
            }),
            WgpuResource::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
            WgpuResource::TextureView(view) | WgpuResource::StorageTextureView(view) => {
                wgpu::BindingResource::TextureView(view)
            }
        }
    }
}

impl BindingResource for WgpuResource {
    fn kind(&self) -> ResourceKind {
        match self {
            WgpuResource::Buffer { .. } => ResourceKind::Buffer,
            WgpuResource::Sampler(_) => ResourceKind::Sampler,
            WgpuResource::TextureView(_) => ResourceKind::Texture,
            WgpuResource::StorageTextureView(_) => ResourceKind::StorageTexture,
        }
    }
}

/// Creates layouts, bind groups and pipeline layouts on a `wgpu::Device`.
#[derive(Debug, Clone)]
pub struct WgpuBackend {
    device: wgpu::Device,
}

impl WgpuBackend {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            device: device.clone(),
        }
    }

    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }
}

fn layout_entry(entry: &ResolvedEntry) -> Result<wgpu::BindGroupLayoutEntry> {
    let ty = match &entry.ty {
        BindingType::Buffer {
            access,
            has_dynamic_offset,
            ..
        } => wgpu::BindingType::Buffer {
            ty: access.as_wgpu(),
            has_dynamic_offset: *has_dynamic_offset,
            min_binding_size: entry.min_binding_size,
        },
        BindingType::Sampler(ty) => wgpu::BindingType::Sampler(*ty),
        BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled,
        } => wgpu::BindingType::Texture {
            sample_type: *sample_type,
            view_dimension: *view_dimension,
            multisampled: *multisampled,
        },
        BindingType::StorageTexture {
            access,
            format,
            view_dimension,
        } => wgpu::BindingType::StorageTexture {
            access: *access,
            format: *format,
            view_dimension: *view_dimension,
        },
        BindingType::ExternalTexture => {
            return Err(TesseraError::Backend(format!(
                "binding `{}`: external textures are not supported by the wgpu backend",
                entry.name
            )));
        }
    };

    Ok(wgpu::BindGroupLayoutEntry {
        binding: entry.binding,
        visibility: entry.visibility,
        ty,
        count: None,
    })
}

impl BindingBackend for WgpuBackend {
    type Resource = WgpuResource;
    type BindGroupLayout = wgpu::BindGroupLayout;
    type BindGroup = wgpu::BindGroup;
    type PipelineLayout = wgpu::PipelineLayout;

    fn create_bind_group_layout(
        &self,
        label: Option<&str>,
        entries: &[ResolvedEntry],
    ) -> Result<wgpu::BindGroupLayout> {
        let entries = entries.iter().map(layout_entry).collect::<Result<Vec<_>>>()?;
        Ok(self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label,
            entries: &entries,
        }))
    }

    fn create_bind_group(
        &self,
        label: Option<&str>,
        layout: &wgpu::BindGroupLayout,
        entries: &[(u32, &WgpuResource)],
    ) -> Result<wgpu::BindGroup> {
        let entries: Vec<wgpu::BindGroupEntry<'_>> = entries
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: resource.as_binding(),
            })
            .collect();
        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label,
            layout,
            entries: &entries,
        }))
    }

    fn create_pipeline_layout(
        &self,
        label: Option<&str>,
        layouts: &[&wgpu::BindGroupLayout],
    ) -> Result<wgpu::PipelineLayout> {
        let layouts: Vec<Option<&wgpu::BindGroupLayout>> =
            layouts.iter().copied().map(Some).collect();
        Ok(self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label,
            bind_group_layouts: &layouts,
            immediate_size: 0,
        }))
    }
}
