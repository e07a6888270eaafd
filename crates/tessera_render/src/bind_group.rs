//! Bind Group Composition
//!
//! Three cooperating types turn named resources into platform bind groups:
//!
//! - [`BindGroupLayout`]: resolves binding indices, validates entries and
//!   creates the platform layout once.
//! - [`BindGroup`]: owns one [`BindResource`] per entry and the composed
//!   platform object built from them.
//! - [`BindResourceMut`]: a mutable handle to one resource of a group.
//!   Replacing the resource immediately rebuilds the whole group.
//!
//! # Rebuild model
//!
//! A bind group is never patched. Every accepted update drops the previous
//! platform object and composes a new one from the full resource list, so
//! `k` updates cost exactly `k` rebuilds, in call order.
//!
//! ```rust,ignore
//! let layout = Arc::new(BindGroupLayout::new(backend, &descriptor)?);
//! let mut group = BindGroup::new(Arc::clone(&layout), [
//!     ("camera", WgpuResource::buffer(&camera_buffer)),
//!     ("albedo", WgpuResource::TextureView(view)),
//! ])?;
//!
//! // Later: swap the texture; the group is rebuilt before this returns.
//! group.resource_mut("albedo")?.update(WgpuResource::TextureView(new_view))?;
//! ```

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tessera_core::errors::{LayoutError, Result, TesseraError};
use tessera_core::resource::ResourceKind;

use crate::backend::{BindingBackend, BindingResource, ResolvedEntry};
use crate::binding::BindingEntry;
use crate::shader_decl::{GroupDeclarations, ShaderDeclEmitter};

// ============================================================================
// Layout descriptor
// ============================================================================

/// Ordered, named binding entries of one bind group.
#[derive(Debug, Clone, Default)]
pub struct BindGroupLayoutDescriptor {
    pub label: Option<String>,
    entries: Vec<(String, BindingEntry)>,
}

impl BindGroupLayoutDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, entry: BindingEntry) -> Self {
        self.push(name, entry);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, entry: BindingEntry) {
        self.entries.push((name.into(), entry));
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = (&str, &BindingEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Assigns binding indices and validates every entry.
    ///
    /// Entries without an explicit index take the index after the previous
    /// entry's, starting at 0, so a list with no explicit indices binds in
    /// declaration order.
    pub fn resolve(&self) -> Result<Vec<ResolvedEntry>> {
        let mut resolved = Vec::with_capacity(self.entries.len());
        let mut names: FxHashSet<&str> = FxHashSet::default();
        let mut taken: FxHashMap<u32, &str> = FxHashMap::default();
        let mut next = 0u32;

        for (name, entry) in &self.entries {
            if !names.insert(name.as_str()) {
                return Err(LayoutError::DuplicateBindingName { name: name.clone() }.into());
            }

            let binding = entry.binding.unwrap_or(next);
            if let Some(first) = taken.insert(binding, name.as_str()) {
                return Err(LayoutError::DuplicateBinding {
                    binding,
                    first: first.to_string(),
                    second: name.clone(),
                }
                .into());
            }
            next = binding.saturating_add(1);

            let min_binding_size = entry.validate(name)?;
            resolved.push(ResolvedEntry {
                name: name.clone(),
                binding,
                visibility: entry.visibility,
                ty: entry.ty.clone(),
                min_binding_size,
            });
        }
        Ok(resolved)
    }
}

// ============================================================================
// BindGroupLayout
// ============================================================================

/// A resolved bind group layout and its platform handle.
pub struct BindGroupLayout<B: BindingBackend> {
    backend: Arc<B>,
    label: Option<String>,
    entries: Vec<ResolvedEntry>,
    index: FxHashMap<String, usize>,
    handle: B::BindGroupLayout,
}

impl<B: BindingBackend> BindGroupLayout<B> {
    /// Resolves the descriptor and creates the platform layout.
    pub fn new(backend: Arc<B>, desc: &BindGroupLayoutDescriptor) -> Result<Self> {
        let entries = desc.resolve()?;
        let handle = backend.create_bind_group_layout(desc.label.as_deref(), &entries)?;

        log::debug!(
            "Created bind group layout {:?} with {} entries",
            desc.label.as_deref().unwrap_or("<unnamed>"),
            entries.len()
        );

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();

        Ok(Self {
            backend,
            label: desc.label.clone(),
            entries,
            index,
            handle,
        })
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Entries in declaration order, with resolved binding indices.
    #[must_use]
    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&ResolvedEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn handle(&self) -> &B::BindGroupLayout {
        &self.handle
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// WGSL declarations for this layout bound at `group`.
    pub fn shader_declarations(&self, group: u32, emitter: &ShaderDeclEmitter) -> Result<GroupDeclarations> {
        emitter.emit_group(group, &self.entries)
    }
}

impl<B: BindingBackend> std::fmt::Debug for BindGroupLayout<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindGroupLayout")
            .field("label", &self.label)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BindResource
// ============================================================================

/// One named resource owned by a [`BindGroup`].
#[derive(Debug)]
pub struct BindResource<R> {
    name: String,
    expected: ResourceKind,
    resource: R,
}

impl<R: BindingResource> BindResource<R> {
    fn new(name: &str, expected: ResourceKind, resource: R) -> Self {
        Self {
            name: name.to_string(),
            expected,
            resource,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind declared by the layout entry.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.expected
    }

    #[must_use]
    pub fn get(&self) -> &R {
        &self.resource
    }
}

fn check_kind<R: BindingResource>(name: &str, expected: ResourceKind, resource: &R) -> Result<()> {
    let found = resource.kind();
    if found != expected {
        return Err(TesseraError::TypeMismatch {
            name: name.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

// ============================================================================
// BindGroup
// ============================================================================

/// A composed bind group that rebuilds itself whenever a resource changes.
pub struct BindGroup<B: BindingBackend> {
    layout: Arc<BindGroupLayout<B>>,
    /// In layout entry order.
    resources: Vec<BindResource<B::Resource>>,
    handle: B::BindGroup,
    generation: u64,
}

impl<B: BindingBackend> BindGroup<B> {
    /// Wraps one resource per layout entry and composes the platform object.
    ///
    /// Fails without creating anything if a resource has the wrong kind, a
    /// name is not declared by the layout or is supplied twice, or an entry
    /// has no resource.
    pub fn new<N, I>(layout: Arc<BindGroupLayout<B>>, resources: I) -> Result<Self>
    where
        N: AsRef<str>,
        I: IntoIterator<Item = (N, B::Resource)>,
    {
        let mut supplied: FxHashMap<String, B::Resource> = FxHashMap::default();
        for (name, resource) in resources {
            let name = name.as_ref();
            let entry = layout.entry(name).ok_or_else(|| TesseraError::UnknownBinding {
                name: name.to_string(),
            })?;
            check_kind(name, entry.ty.resource_kind(), &resource)?;
            if supplied.insert(name.to_string(), resource).is_some() {
                return Err(TesseraError::DuplicateResource {
                    name: name.to_string(),
                });
            }
        }

        let mut wrapped = Vec::with_capacity(layout.entries().len());
        for entry in layout.entries() {
            let resource = supplied
                .remove(&entry.name)
                .ok_or_else(|| TesseraError::MissingResource {
                    name: entry.name.clone(),
                })?;
            wrapped.push(BindResource::new(&entry.name, entry.ty.resource_kind(), resource));
        }

        let handle = compose(&layout, &wrapped)?;
        log::debug!(
            "Built bind group {:?} (generation 0, {} entries)",
            layout.label().unwrap_or("<unnamed>"),
            wrapped.len()
        );

        Ok(Self {
            layout,
            resources: wrapped,
            handle,
            generation: 0,
        })
    }

    #[must_use]
    pub fn layout(&self) -> &Arc<BindGroupLayout<B>> {
        &self.layout
    }

    /// The current platform object. Replaced on every rebuild.
    #[must_use]
    pub fn handle(&self) -> &B::BindGroup {
        &self.handle
    }

    /// Number of rebuilds since construction.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn resources(&self) -> impl ExactSizeIterator<Item = &BindResource<B::Resource>> {
        self.resources.iter()
    }

    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&BindResource<B::Resource>> {
        self.layout.index.get(name).map(|&i| &self.resources[i])
    }

    /// Mutable access to one resource for replacement.
    pub fn resource_mut(&mut self, name: &str) -> Result<BindResourceMut<'_, B>> {
        let index = *self.layout.index.get(name).ok_or_else(|| TesseraError::UnknownBinding {
            name: name.to_string(),
        })?;
        Ok(BindResourceMut { group: self, index })
    }

    /// Shorthand for `resource_mut(name)?.update(resource)`.
    pub fn update(&mut self, name: &str, resource: B::Resource) -> Result<()> {
        self.resource_mut(name)?.update(resource)
    }

    /// Recomposes the platform object from the current resources.
    pub fn rebuild(&mut self) -> Result<()> {
        let handle = compose(&self.layout, &self.resources)?;
        self.handle = handle;
        self.generation += 1;
        log::debug!(
            "Rebuilt bind group {:?} (generation {}, {} entries)",
            self.layout.label().unwrap_or("<unnamed>"),
            self.generation,
            self.resources.len()
        );
        Ok(())
    }
}

impl<B: BindingBackend> std::fmt::Debug for BindGroup<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindGroup")
            .field("label", &self.layout.label)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

fn compose<B: BindingBackend>(
    layout: &BindGroupLayout<B>,
    resources: &[BindResource<B::Resource>],
) -> Result<B::BindGroup> {
    let entries: Vec<(u32, &B::Resource)> = layout
        .entries
        .iter()
        .zip(resources)
        .map(|(entry, resource)| (entry.binding, &resource.resource))
        .collect();
    layout
        .backend
        .create_bind_group(layout.label.as_deref(), &layout.handle, &entries)
}

// ============================================================================
// BindResourceMut
// ============================================================================

/// A resource slot of a [`BindGroup`], borrowed for replacement.
pub struct BindResourceMut<'g, B: BindingBackend> {
    group: &'g mut BindGroup<B>,
    index: usize,
}

impl<B: BindingBackend> BindResourceMut<'_, B> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.group.resources[self.index].name
    }

    #[must_use]
    pub fn get(&self) -> &B::Resource {
        &self.group.resources[self.index].resource
    }

    /// Replaces the resource and rebuilds the owning group.
    ///
    /// A resource of the wrong kind is rejected before anything changes. If
    /// the backend fails to compose the new group, the previous resource is
    /// put back and the group keeps its last good object.
    pub fn update(self, resource: B::Resource) -> Result<()> {
        let slot = &mut self.group.resources[self.index];
        check_kind(&slot.name, slot.expected, &resource)?;
        let previous = std::mem::replace(&mut slot.resource, resource);

        if let Err(err) = self.group.rebuild() {
            let slot = &mut self.group.resources[self.index];
            log::warn!("Rebuild after updating `{}` failed, restoring previous resource: {err}", slot.name);
            slot.resource = previous;
            return Err(err);
        }
        Ok(())
    }
}
