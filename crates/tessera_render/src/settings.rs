//! Emitter Settings
//!
//! Naming and formatting knobs for generated WGSL.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tessera_render::{EmitterSettings, ShaderDeclEmitter};
//!
//! // Default: `S_<binding>` struct names, `VsIn` vertex input, two-space indent
//! let emitter = ShaderDeclEmitter::default();
//!
//! let emitter = ShaderDeclEmitter::new(EmitterSettings {
//!     struct_prefix: "Block_".into(),
//!     ..Default::default()
//! });
//! ```

use serde::{Deserialize, Serialize};

/// Naming and formatting of generated WGSL declarations.
///
/// Changing these only affects text; layouts and binding indices are the
/// same under every setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    /// Prefix of the root struct name generated for a buffer binding.
    ///
    /// A buffer bound as `camera` is declared as `<prefix>camera`; its nested
    /// structs extend that name with `_<field>`.
    pub struct_prefix: String,

    /// Name of the merged vertex-input struct.
    pub vertex_input_name: String,

    /// Indentation of struct members.
    pub indent: String,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            struct_prefix: "S_".to_string(),
            vertex_input_name: "VsIn".to_string(),
            indent: "  ".to_string(),
        }
    }
}

impl EmitterSettings {
    /// Root struct name for a buffer binding.
    #[must_use]
    pub fn struct_name(&self, binding_name: &str) -> String {
        format!("{}{binding_name}", self.struct_prefix)
    }
}
