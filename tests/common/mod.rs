//! In-memory `BindingBackend` that records every object it is asked to
//! create, so composition can be tested without a GPU.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use tessera_render::{BindingBackend, BindingResource, ResolvedEntry};
use tessera::{ResourceKind, Result, TesseraError};

/// Routes `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fake resource: a kind tag plus an id to tell instances apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockResource {
    Buffer(u32),
    Sampler(u32),
    Texture(u32),
    StorageTexture(u32),
    ExternalTexture(u32),
}

impl BindingResource for MockResource {
    fn kind(&self) -> ResourceKind {
        match self {
            MockResource::Buffer(_) => ResourceKind::Buffer,
            MockResource::Sampler(_) => ResourceKind::Sampler,
            MockResource::Texture(_) => ResourceKind::Texture,
            MockResource::StorageTexture(_) => ResourceKind::StorageTexture,
            MockResource::ExternalTexture(_) => ResourceKind::ExternalTexture,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedLayout {
    pub label: Option<String>,
    pub entries: Vec<ResolvedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedGroup {
    pub label: Option<String>,
    pub layout: usize,
    pub entries: Vec<(u32, MockResource)>,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub layouts: RefCell<Vec<RecordedLayout>>,
    pub groups: RefCell<Vec<RecordedGroup>>,
    pub pipeline_layouts: RefCell<Vec<Vec<usize>>>,
    /// When set, the next `create_bind_group` call fails.
    pub fail_next_group: Cell<bool>,
}

impl RecordingBackend {
    pub fn group_count(&self) -> usize {
        self.groups.borrow().len()
    }

    pub fn last_group(&self) -> Option<RecordedGroup> {
        self.groups.borrow().last().cloned()
    }
}

impl BindingBackend for RecordingBackend {
    type Resource = MockResource;
    /// Index into `layouts`.
    type BindGroupLayout = usize;
    /// Index into `groups`.
    type BindGroup = usize;
    type PipelineLayout = Vec<usize>;

    fn create_bind_group_layout(&self, label: Option<&str>, entries: &[ResolvedEntry]) -> Result<usize> {
        let mut layouts = self.layouts.borrow_mut();
        layouts.push(RecordedLayout {
            label: label.map(str::to_string),
            entries: entries.to_vec(),
        });
        Ok(layouts.len() - 1)
    }

    fn create_bind_group(
        &self,
        label: Option<&str>,
        layout: &usize,
        entries: &[(u32, &MockResource)],
    ) -> Result<usize> {
        if self.fail_next_group.replace(false) {
            return Err(TesseraError::Backend("device lost".to_string()));
        }
        let mut groups = self.groups.borrow_mut();
        groups.push(RecordedGroup {
            label: label.map(str::to_string),
            layout: *layout,
            entries: entries.iter().map(|(binding, resource)| (*binding, **resource)).collect(),
        });
        Ok(groups.len() - 1)
    }

    fn create_pipeline_layout(&self, _label: Option<&str>, layouts: &[&usize]) -> Result<Vec<usize>> {
        let ids: Vec<usize> = layouts.iter().map(|id| **id).collect();
        self.pipeline_layouts.borrow_mut().push(ids.clone());
        Ok(ids)
    }
}
