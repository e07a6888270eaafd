//! # Tessera
//!
//! Describe a GPU struct once and get, from that single description:
//!
//! - its host-shareable layout (offsets, sizes, alignment, strides),
//! - a zero-copy CPU view for reading and writing the buffer bytes,
//! - matching WGSL `struct` and `@group/@binding` declarations,
//! - bind groups that rebuild themselves when a resource is swapped,
//! - vertex buffer layouts and a vertex-input struct for vertex data.
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! let light = StructDescriptor::new()
//!     .with("position", Primitive::VEC3_F32)
//!     .with("range", Primitive::F32);
//! let lights = StructDescriptor::new()
//!     .with("count", Primitive::U32)
//!     .with("lights", FieldType::array(light, 4));
//!
//! let mut buffer = StructBuffer::new(lights)?;
//! buffer.view_mut().set("count", 1.0)?;
//! buffer.view_mut().set_path("lights[0].range", 25.0)?;
//! queue.write_buffer(&gpu_buffer, 0, buffer.as_bytes());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub use tessera_core;
pub use tessera_render;
pub use tessera_view;

pub use tessera_core::{
    ArrayLength, FieldType, LayoutError, Packing, Primitive, ResourceKind, Result, ScalarKind, StructDescriptor,
    StructLayout, TesseraError,
};
pub use tessera_render::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindingBackend, BindingEntry, BindingResource,
    BufferAccess, EmitterSettings, PipelineLayout, ShaderDeclEmitter, VertexBufferLayout, VertexLayout, WgpuBackend,
    WgpuResource,
};
pub use tessera_view::{StructBuffer, View, ViewBuilder, ViewMut};

pub mod prelude {
    //! Common imports.
    //!
    //! ```rust,ignore
    //! use tessera::prelude::*;
    //! ```

    pub use crate::{
        BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindingEntry, BufferAccess, FieldType, Packing,
        PipelineLayout, Primitive, StructBuffer, StructDescriptor, TesseraError, VertexBufferLayout, VertexLayout,
        WgpuBackend, WgpuResource,
    };
    pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
    pub use wgpu::ShaderStages;
}
