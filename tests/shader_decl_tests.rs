//! Shader Declaration Tests
//!
//! Tests for:
//! - Pipeline preamble: struct blocks per group, binding lines in group order
//! - Nested struct naming and ordering
//! - Buffer access modes and binding index assignment
//! - Emitter settings

mod common;

use std::sync::Arc;

use tessera::{
    BindGroupLayout, BindGroupLayoutDescriptor, BindingEntry, EmitterSettings, FieldType, LayoutError, PipelineLayout,
    Primitive, ShaderDeclEmitter, StructDescriptor, TesseraError,
};
use tessera_render::{emit_binding_decl, emit_struct};
use wgpu::ShaderStages;

use common::RecordingBackend;

const PIPELINE_PREAMBLE: &str = r"

struct S_camera {
  projection: mat4x4<f32>,
  modelView: mat4x4<f32>,
  near: f32,
  far: f32,
};
struct S_globalLights_lights {
  position: vec3<f32>,
  range: f32,
  color: vec3<f32>,
  intensity: f32,
};
struct S_globalLights {
  ambient: vec3<f32>,
  lightCount: u32,
  lights: array<S_globalLights_lights, 1000>,
};
struct S_clusterLights_lights {
  offset: u32,
  count: u32,
};
struct S_clusterLights {
  offset: u32,
  lights: array<S_clusterLights_lights, 100>,
};
struct S_clusterIndices_indices {
  x: u32,
};
struct S_clusterIndices {
  indices: array<S_clusterIndices_indices, 10000>,
};

struct S_model {
  worldMatrix: mat4x4<f32>,
};

struct S_material {
  color: vec3<f32>,
};
@group(0) @binding(0) var<uniform> camera: S_camera;
@group(0) @binding(1) var<storage, read> globalLights: S_globalLights;
@group(0) @binding(2) var<storage, read_write> clusterLights: S_clusterLights;
@group(0) @binding(3) var<storage, read_write> clusterIndices: S_clusterIndices;
@group(1) @binding(0) var<uniform> model: S_model;
@group(2) @binding(0) var<uniform> material: S_material;";

fn scene_layout() -> BindGroupLayoutDescriptor {
    let camera = StructDescriptor::new()
        .with("projection", Primitive::MAT4X4_F32)
        .with("modelView", Primitive::MAT4X4_F32)
        .with("near", Primitive::F32)
        .with("far", Primitive::F32);

    let global_lights = StructDescriptor::from_json(
        r#"{
            "ambient": "vec3_f32",
            "lightCount": "u32",
            "lights": [
                { "position": "vec3_f32", "range": "f32", "color": "vec3_f32", "intensity": "f32" },
                1000
            ]
        }"#,
    )
    .unwrap();

    let cluster_lights = StructDescriptor::new().with("offset", Primitive::U32).with(
        "lights",
        FieldType::array(
            StructDescriptor::new()
                .with("offset", Primitive::U32)
                .with("count", Primitive::U32),
            100,
        ),
    );

    let cluster_indices = StructDescriptor::new().with(
        "indices",
        FieldType::array(StructDescriptor::new().with("x", Primitive::U32), 100 * 100),
    );

    BindGroupLayoutDescriptor::new()
        .with_label("scene")
        .with("camera", BindingEntry::uniform(ShaderStages::VERTEX, camera))
        .with(
            "globalLights",
            BindingEntry::read_only_storage(ShaderStages::VERTEX_FRAGMENT | ShaderStages::COMPUTE, global_lights),
        )
        .with(
            "clusterLights",
            BindingEntry::storage(ShaderStages::FRAGMENT | ShaderStages::COMPUTE, cluster_lights),
        )
        .with(
            "clusterIndices",
            BindingEntry::storage(ShaderStages::COMPUTE | ShaderStages::FRAGMENT, cluster_indices),
        )
}

fn single_uniform(label: &str, name: &str, desc: StructDescriptor) -> BindGroupLayoutDescriptor {
    BindGroupLayoutDescriptor::new()
        .with_label(label)
        .with(name, BindingEntry::uniform(ShaderStages::VERTEX_FRAGMENT, desc))
}

// ============================================================================
// Pipeline preamble
// ============================================================================

#[test]
fn pipeline_layout_emits_the_full_preamble() {
    let backend = Arc::new(RecordingBackend::default());

    let scene = Arc::new(BindGroupLayout::new(Arc::clone(&backend), &scene_layout()).unwrap());
    let model = Arc::new(
        BindGroupLayout::new(
            Arc::clone(&backend),
            &single_uniform("model", "model", StructDescriptor::new().with("worldMatrix", Primitive::MAT4X4_F32)),
        )
        .unwrap(),
    );
    let material = Arc::new(
        BindGroupLayout::new(
            Arc::clone(&backend),
            &single_uniform("material", "material", StructDescriptor::new().with("color", Primitive::VEC3_F32)),
        )
        .unwrap(),
    );

    let pipeline = PipelineLayout::new(&*backend, [scene, model, material]).unwrap();

    assert_eq!(pipeline.shader_code(), PIPELINE_PREAMBLE);
    assert_eq!(pipeline.handle(), &vec![0, 1, 2]);
    assert_eq!(pipeline.layouts().len(), 3);
}

#[test]
fn min_binding_size_comes_from_the_struct() {
    let backend = Arc::new(RecordingBackend::default());
    let scene = BindGroupLayout::new(Arc::clone(&backend), &scene_layout()).unwrap();

    let sizes: Vec<u64> = scene
        .entries()
        .iter()
        .map(|e| e.min_binding_size.map_or(0, |s| s.get()))
        .collect();
    // camera: 2 * 64 + 2 * 4 rounded to 16; globalLights: 16 + 1000 * 32
    assert_eq!(sizes, [144, 32_016, 804, 40_000]);

    let recorded = backend.layouts.borrow();
    assert_eq!(recorded[0].label.as_deref(), Some("scene"));
    assert_eq!(recorded[0].entries.len(), 4);
}

// ============================================================================
// Struct emission
// ============================================================================

#[test]
fn nested_array_element_struct_precedes_owner() {
    let elem = StructDescriptor::new()
        .with("offset", Primitive::U32)
        .with("count", Primitive::U32);
    let desc = StructDescriptor::new()
        .with("offset", Primitive::U32)
        .with("lights", FieldType::array(elem, 100));

    let code = emit_struct("S_clusterLights", &desc).unwrap();
    let inner = code.find("struct S_clusterLights_lights {").unwrap();
    let outer = code.find("struct S_clusterLights {").unwrap();
    assert!(inner < outer);
    assert!(code.ends_with("lights: array<S_clusterLights_lights, 100>,\n};"));
}

#[test]
fn runtime_array_renders_without_length() {
    let desc = StructDescriptor::new()
        .with("count", Primitive::U32)
        .with("items", FieldType::runtime_array(StructDescriptor::new().with("v", Primitive::VEC4_F32)));
    let code = emit_struct("S_items", &desc).unwrap();
    assert!(code.contains("  items: array<S_items_items>,\n"));
}

#[test]
fn integer_vectors_and_matrices_use_wgsl_names() {
    let desc = StructDescriptor::new()
        .with("a", Primitive::VEC2_I32)
        .with("b", Primitive::VEC4_U32)
        .with("c", Primitive::MAT3X3_F32);
    assert_eq!(
        emit_struct("S_t", &desc).unwrap(),
        "struct S_t {\n  a: vec2<i32>,\n  b: vec4<u32>,\n  c: mat3x3<f32>,\n};"
    );
}

#[test]
fn struct_names_are_unique_across_a_group() {
    let backend = Arc::new(RecordingBackend::default());
    let desc = BindGroupLayoutDescriptor::new()
        .with(
            "a",
            BindingEntry::uniform(
                ShaderStages::VERTEX,
                StructDescriptor::new().with("b", StructDescriptor::new().with("x", Primitive::VEC4_F32)),
            ),
        )
        .with(
            "a_b",
            BindingEntry::uniform(ShaderStages::VERTEX, StructDescriptor::new().with("y", Primitive::F32)),
        );
    let layout = BindGroupLayout::new(backend, &desc).unwrap();

    let err = layout.shader_declarations(0, &ShaderDeclEmitter::default()).unwrap_err();
    assert_eq!(err, TesseraError::Layout(LayoutError::DuplicateStructName { name: "S_a_b".into() }));
}

// ============================================================================
// Binding lines
// ============================================================================

#[test]
fn buffer_binding_lines() {
    let desc = StructDescriptor::new().with("x", Primitive::F32);
    let vis = ShaderStages::COMPUTE;

    assert_eq!(
        emit_binding_decl(0, 0, "params", &BindingEntry::uniform(vis, desc.clone())).unwrap(),
        "@group(0) @binding(0) var<uniform> params: S_params;"
    );
    assert_eq!(
        emit_binding_decl(2, 5, "data", &BindingEntry::read_only_storage(vis, desc.clone())).unwrap(),
        "@group(2) @binding(5) var<storage, read> data: S_data;"
    );
    assert_eq!(
        emit_binding_decl(1, 1, "out", &BindingEntry::storage(vis, desc)).unwrap(),
        "@group(1) @binding(1) var<storage, read_write> out: S_out;"
    );
}

#[test]
fn explicit_binding_indices_are_respected() {
    let backend = Arc::new(RecordingBackend::default());
    let desc = BindGroupLayoutDescriptor::new()
        .with(
            "albedo",
            BindingEntry::texture(
                ShaderStages::FRAGMENT,
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::TextureViewDimension::D2,
            )
            .with_binding(4),
        )
        .with(
            "albedo_sampler",
            BindingEntry::sampler(ShaderStages::FRAGMENT, wgpu::SamplerBindingType::Filtering),
        );
    let layout = BindGroupLayout::new(backend, &desc).unwrap();
    let decls = layout.shader_declarations(3, &ShaderDeclEmitter::default()).unwrap();

    assert!(decls.structs.is_empty());
    assert_eq!(
        decls.bindings,
        [
            "@group(3) @binding(4) var albedo: texture_2d<f32>;",
            "@group(3) @binding(5) var albedo_sampler: sampler;",
        ]
    );
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_load_from_json() -> anyhow::Result<()> {
    let settings: EmitterSettings = serde_json::from_str(r#"{ "struct_prefix": "Buf" }"#)?;
    assert_eq!(settings.struct_prefix, "Buf");
    assert_eq!(settings.vertex_input_name, "VsIn");

    let emitter = ShaderDeclEmitter::new(settings);
    let entry = BindingEntry::storage(ShaderStages::COMPUTE, StructDescriptor::new().with("n", Primitive::U32));
    assert_eq!(
        emitter.emit_binding_decl(0, 2, "counts", &entry)?,
        "@group(0) @binding(2) var<storage, read_write> counts: Bufcounts;"
    );
    Ok(())
}

#[test]
fn custom_prefix_and_indent() {
    let emitter = ShaderDeclEmitter::new(EmitterSettings {
        struct_prefix: "U_".to_string(),
        indent: "    ".to_string(),
        ..Default::default()
    });
    let entry = BindingEntry::uniform(ShaderStages::VERTEX, StructDescriptor::new().with("t", Primitive::F32));

    assert_eq!(
        emitter.emit_binding_decl(0, 0, "time", &entry).unwrap(),
        "@group(0) @binding(0) var<uniform> time: U_time;"
    );
    assert_eq!(
        emitter
            .emit_struct("U_time", &StructDescriptor::new().with("t", Primitive::F32))
            .unwrap(),
        "struct U_time {\n    t: f32,\n};"
    );
}
