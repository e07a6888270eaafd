//! CPU-side struct buffers.
//!
//! [`StructBuffer`] owns a zero-initialized byte region sized for a struct
//! descriptor's layout and hands out views over it. The bytes are what gets
//! uploaded to the GPU, see [`StructBuffer::as_bytes`].

use std::sync::Arc;

use tessera_core::descriptor::StructDescriptor;
use tessera_core::errors::Result;
use tessera_core::layout::{Packing, StructLayout};

use crate::view::{View, ViewBuilder, ViewMut};

/// An owned, 4-byte aligned buffer holding one instance of a struct.
#[derive(Debug)]
pub struct StructBuffer {
    descriptor: Arc<StructDescriptor>,
    layout: Arc<StructLayout>,
    words: Vec<u32>,
    byte_len: usize,
    runtime_len: usize,
}

impl StructBuffer {
    /// Allocates a zeroed buffer using host-shareable layout rules.
    ///
    /// A trailing runtime-sized array gets zero elements; use
    /// [`Self::with_runtime_len`] to size it.
    pub fn new(descriptor: impl Into<Arc<StructDescriptor>>) -> Result<Self> {
        Self::with_options(descriptor, Packing::Standard, 0)
    }

    /// Allocates a zeroed buffer whose trailing runtime-sized array holds
    /// `runtime_len` elements.
    pub fn with_runtime_len(descriptor: impl Into<Arc<StructDescriptor>>, runtime_len: usize) -> Result<Self> {
        Self::with_options(descriptor, Packing::Standard, runtime_len)
    }

    /// Allocates a zeroed buffer without alignment padding, for vertex data.
    pub fn packed(descriptor: impl Into<Arc<StructDescriptor>>) -> Result<Self> {
        Self::with_options(descriptor, Packing::Tight, 0)
    }

    pub fn with_options(
        descriptor: impl Into<Arc<StructDescriptor>>,
        packing: Packing,
        runtime_len: usize,
    ) -> Result<Self> {
        let descriptor = descriptor.into();
        let layout = descriptor.layout(packing)?;
        let byte_len = layout.size_for(runtime_len)?;
        let words = vec![0u32; byte_len.div_ceil(4)];

        ViewBuilder::new(&layout)
            .runtime_len(runtime_len)
            .validate(&bytemuck::cast_slice::<u32, u8>(&words)[..byte_len])?;

        log::trace!(
            "Allocated struct buffer: {byte_len} bytes ({packing:?}, {runtime_len} runtime elements)"
        );

        Ok(Self {
            descriptor,
            layout,
            words,
            byte_len,
            runtime_len,
        })
    }

    /// A fresh zeroed buffer for the same descriptor, packing and runtime
    /// length. Field values are not copied.
    #[must_use]
    pub fn clone_layout(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            layout: Arc::clone(&self.layout),
            words: vec![0u32; self.words.len()],
            byte_len: self.byte_len,
            runtime_len: self.runtime_len,
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    #[must_use]
    pub fn layout(&self) -> &StructLayout {
        &self.layout
    }

    #[must_use]
    pub fn packing(&self) -> Packing {
        self.layout.packing()
    }

    #[inline]
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    #[must_use]
    pub fn runtime_len(&self) -> usize {
        self.runtime_len
    }

    /// The raw bytes, ready for `queue.write_buffer`.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u32, u8>(&self.words)[..self.byte_len]
    }

    #[must_use]
    pub fn view(&self) -> View<'_> {
        View::from_validated(self.builder(), self.as_bytes())
    }

    #[must_use]
    pub fn view_mut(&mut self) -> ViewMut<'_> {
        let builder = ViewBuilder::new(&self.layout).runtime_len(self.runtime_len);
        let bytes = &mut bytemuck::cast_slice_mut::<u32, u8>(&mut self.words)[..self.byte_len];
        ViewMut::from_validated(builder, bytes)
    }

    /// Zeroes every byte.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    fn builder(&self) -> ViewBuilder<'_> {
        ViewBuilder::new(&self.layout).runtime_len(self.runtime_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::descriptor::{FieldType, Primitive};

    #[test]
    fn unsized_struct_grows_with_runtime_len() {
        let light = StructDescriptor::new()
            .with("position", Primitive::VEC3_F32)
            .with("range", Primitive::F32);
        let desc = StructDescriptor::new()
            .with("count", Primitive::U32)
            .with("lights", FieldType::runtime_array(light));
        let desc = Arc::new(desc);

        assert_eq!(StructBuffer::new(Arc::clone(&desc)).unwrap().byte_len(), 16);
        let buffer = StructBuffer::with_runtime_len(desc, 3).unwrap();
        assert_eq!(buffer.byte_len(), 16 + 3 * 16);
        assert_eq!(buffer.view().array("lights").unwrap().len(), 3);
    }

    #[test]
    fn clone_layout_is_zeroed() {
        let desc = StructDescriptor::new().with("x", Primitive::F32);
        let mut a = StructBuffer::new(desc).unwrap();
        a.view_mut().set("x", 2.5).unwrap();

        let b = a.clone_layout();
        assert_eq!(b.view().get("x").unwrap(), 0.0);
        assert_eq!(a.view().get("x").unwrap(), 2.5);
        assert!(Arc::ptr_eq(a.descriptor(), b.descriptor()));
    }

    #[test]
    fn clear_zeroes_the_buffer() {
        let desc = StructDescriptor::new().with("n", Primitive::U32);
        let mut buffer = StructBuffer::new(desc).unwrap();
        buffer.view_mut().set("n", 9.0).unwrap();
        buffer.clear();
        assert_eq!(buffer.as_bytes(), &[0u8; 4]);
    }
}
