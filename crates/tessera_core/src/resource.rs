//! Resource kind tags.
//!
//! The engine never looks inside a resource handle. It only compares the kind
//! tag a handle reports against the kind its binding entry declares.

use std::fmt;

/// The kind of a bindable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A (region of a) uniform or storage buffer.
    Buffer,
    Sampler,
    /// A sampled texture view.
    Texture,
    /// A texture view bound for storage access.
    StorageTexture,
    ExternalTexture,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Sampler => "sampler",
            ResourceKind::Texture => "texture",
            ResourceKind::StorageTexture => "storage texture",
            ResourceKind::ExternalTexture => "external texture",
        };
        f.write_str(name)
    }
}
