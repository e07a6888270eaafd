//! Platform boundary.
//!
//! The composer never talks to a GPU API directly. It resolves layouts and
//! resources into plain descriptions and hands them to a [`BindingBackend`],
//! which owns the platform objects. [`crate::WgpuBackend`] is the production
//! implementation; tests use an in-memory recorder.

use std::num::NonZeroU64;

use tessera_core::errors::Result;
use tessera_core::resource::ResourceKind;
use wgpu::ShaderStages;

use crate::binding::BindingType;

/// An opaque resource handle the composer can bind.
///
/// Only the kind tag is inspected; the handle itself is passed through to
/// the backend untouched.
pub trait BindingResource {
    fn kind(&self) -> ResourceKind;
}

/// A layout entry after binding indices have been assigned.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub name: String,
    pub binding: u32,
    pub visibility: ShaderStages,
    pub ty: BindingType,
    /// Size of the bound struct for buffer entries.
    pub min_binding_size: Option<NonZeroU64>,
}

/// Factory for the platform objects behind layouts and bind groups.
pub trait BindingBackend {
    type Resource: BindingResource;
    type BindGroupLayout;
    type BindGroup;
    type PipelineLayout;

    fn create_bind_group_layout(&self, label: Option<&str>, entries: &[ResolvedEntry])
    -> Result<Self::BindGroupLayout>;

    /// `entries` pairs each binding index with its resource, in layout order.
    fn create_bind_group(
        &self,
        label: Option<&str>,
        layout: &Self::BindGroupLayout,
        entries: &[(u32, &Self::Resource)],
    ) -> Result<Self::BindGroup>;

    /// `layouts` are in group index order.
    fn create_pipeline_layout(
        &self,
        label: Option<&str>,
        layouts: &[&Self::BindGroupLayout],
    ) -> Result<Self::PipelineLayout>;
}
