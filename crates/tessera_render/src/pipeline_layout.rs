//! Pipeline layouts.
//!
//! A [`PipelineLayout`] stacks bind group layouts into groups `0..N` (list
//! position is the group index) and produces the matching WGSL preamble:
//! every group's struct blocks, then every binding line.

use std::sync::Arc;

use tessera_core::errors::Result;

use crate::backend::BindingBackend;
use crate::bind_group::BindGroupLayout;
use crate::shader_decl::ShaderDeclEmitter;

/// An ordered set of bind group layouts plus its shader preamble.
pub struct PipelineLayout<B: BindingBackend> {
    layouts: Vec<Arc<BindGroupLayout<B>>>,
    handle: B::PipelineLayout,
    shader_code: String,
}

impl<B: BindingBackend> PipelineLayout<B> {
    /// Composes `layouts` with the default emitter settings.
    pub fn new(backend: &B, layouts: impl IntoIterator<Item = Arc<BindGroupLayout<B>>>) -> Result<Self> {
        Self::with_emitter(backend, None, layouts, &ShaderDeclEmitter::default())
    }

    pub fn with_emitter(
        backend: &B,
        label: Option<&str>,
        layouts: impl IntoIterator<Item = Arc<BindGroupLayout<B>>>,
        emitter: &ShaderDeclEmitter,
    ) -> Result<Self> {
        let layouts: Vec<_> = layouts.into_iter().collect();

        let mut struct_sections = Vec::new();
        let mut binding_lines = Vec::new();
        for (group, layout) in (0u32..).zip(&layouts) {
            let decls = layout.shader_declarations(group, emitter)?;
            if !decls.structs.is_empty() {
                struct_sections.push(decls.structs);
            }
            binding_lines.extend(decls.bindings);
        }
        let shader_code = format!(
            "\n\n{}\n{}",
            struct_sections.join("\n\n"),
            binding_lines.join("\n")
        );

        let handles: Vec<&B::BindGroupLayout> = layouts.iter().map(|layout| layout.handle()).collect();
        let handle = backend.create_pipeline_layout(label, &handles)?;

        log::debug!("Created pipeline layout with {} bind groups", layouts.len());

        Ok(Self {
            layouts,
            handle,
            shader_code,
        })
    }

    /// Bind group layouts in group index order.
    #[must_use]
    pub fn layouts(&self) -> &[Arc<BindGroupLayout<B>>] {
        &self.layouts
    }

    #[must_use]
    pub fn handle(&self) -> &B::PipelineLayout {
        &self.handle
    }

    /// WGSL struct and binding declarations for every group, to be prepended
    /// to shader source.
    #[must_use]
    pub fn shader_code(&self) -> &str {
        &self.shader_code
    }
}

impl<B: BindingBackend> std::fmt::Debug for PipelineLayout<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineLayout")
            .field("layouts", &self.layouts)
            .finish_non_exhaustive()
    }
}
