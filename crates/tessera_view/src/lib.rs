//! Tessera View
//!
//! Typed, zero-copy access to struct data laid out by `tessera_core`:
//!
//! - [`view`]: [`ViewBuilder`] validates a byte region against a layout and
//!   produces [`View`] / [`ViewMut`] accessor trees
//! - [`struct_buffer`]: [`StructBuffer`], an owned zeroed region plus views

pub mod struct_buffer;
pub mod view;

pub use struct_buffer::StructBuffer;
pub use view::{ArrayView, ArrayViewMut, View, ViewBuilder, ViewMut, WindowElement, wrap_i32, wrap_u32};
