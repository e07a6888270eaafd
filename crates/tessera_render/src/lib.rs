//! Tessera Render
//!
//! The GPU-facing half of the binding engine:
//!
//! - [`shader_decl`]: WGSL struct and binding declarations from descriptors
//! - [`binding`]: binding entries and buffer access modes
//! - [`bind_group`]: layout / group / resource composition with rebuild on update
//! - [`pipeline_layout`]: ordered group layouts plus the shader preamble
//! - [`vertex_layout`]: tightly packed vertex buffer layouts and vertex input
//! - [`backend`]: the [`BindingBackend`] boundary, with [`WgpuBackend`]
//!   as the production implementation

pub mod backend;
pub mod bind_group;
pub mod binding;
pub mod pipeline_layout;
pub mod settings;
pub mod shader_decl;
pub mod vertex_layout;
pub mod wgpu_backend;

pub use backend::{BindingBackend, BindingResource, ResolvedEntry};
pub use bind_group::{BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindResource, BindResourceMut};
pub use binding::{BindingEntry, BindingType, BufferAccess};
pub use pipeline_layout::PipelineLayout;
pub use settings::EmitterSettings;
pub use shader_decl::{GroupDeclarations, ShaderDeclEmitter, emit_binding_decl, emit_struct};
pub use vertex_layout::{OwnedVertexBufferDesc, VertexBufferLayout, VertexField, VertexLayout, vertex_format};
pub use wgpu_backend::{WgpuBackend, WgpuResource};
