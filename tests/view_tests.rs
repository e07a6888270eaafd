//! Struct View Tests
//!
//! Tests for:
//! - StructBuffer: allocation size, zero initialization, raw bytes
//! - Scalar access: round trips, unsigned / signed wrapping (fixed and seeded random values)
//! - Vector / matrix windows: shared storage, fixed length, glam helpers
//! - Composite fields: immutability, nested views, array bounds
//! - Path API
//! - ViewBuilder guards over caller-supplied memory
//! - Runtime-sized arrays and tightly packed buffers

use glam::{Mat3, Mat4, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use tessera::{FieldType, LayoutError, Packing, Primitive, StructBuffer, StructDescriptor, TesseraError, ViewBuilder};

fn all_primitives() -> StructDescriptor {
    StructDescriptor::new()
        .with("u32_", Primitive::U32)
        .with("i32_", Primitive::I32)
        .with("f32_", Primitive::F32)
        .with("vec2_", Primitive::VEC2_F32)
        .with("vec3_", Primitive::VEC3_F32)
        .with("vec4_", Primitive::VEC4_F32)
        .with("mat3_", Primitive::MAT3X3_F32)
        .with("mat4_", Primitive::MAT4X4_F32)
}

fn light() -> StructDescriptor {
    StructDescriptor::new()
        .with("position", Primitive::VEC3_F32)
        .with("range", Primitive::F32)
        .with("color", Primitive::VEC3_F32)
        .with("intensity", Primitive::F32)
}

fn lights() -> StructDescriptor {
    StructDescriptor::new()
        .with("ambient", Primitive::VEC3_F32)
        .with("lightCount", Primitive::U32)
        .with("lights", FieldType::array(light(), 4))
}

fn f32_at(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

// ============================================================================
// StructBuffer
// ============================================================================

#[test]
fn buffer_is_sized_and_zeroed() {
    let buffer = StructBuffer::new(all_primitives()).unwrap();
    assert_eq!(buffer.byte_len(), 176);
    assert_eq!(buffer.as_bytes().len(), 176);
    assert!(buffer.as_bytes().iter().all(|&b| b == 0));
    assert_eq!(buffer.packing(), Packing::Standard);
}

#[test]
fn invalid_descriptor_fails_construction() {
    assert!(matches!(
        StructBuffer::new(StructDescriptor::new()),
        Err(TesseraError::Layout(_))
    ));
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn unsigned_wraps_negative_numbers() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    let mut view = buffer.view_mut();

    view.set("u32_", -1.0).unwrap();
    assert_eq!(view.get("u32_").unwrap(), 4_294_967_295.0);
    assert_eq!(view.get_u32("u32_").unwrap(), u32::MAX);

    view.set("u32_", 4_294_967_296.0 + 5.0).unwrap();
    assert_eq!(view.get("u32_").unwrap(), 5.0);
}

#[test]
fn signed_and_float_round_trip() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    {
        let mut view = buffer.view_mut();
        view.set("i32_", -42.0).unwrap();
        view.set("f32_", 0.25).unwrap();
        assert_eq!(view.get("i32_").unwrap(), -42.0);
        assert_eq!(view.get_f32("f32_").unwrap(), 0.25);

        view.set("i32_", 4_294_967_295.0).unwrap();
        assert_eq!(view.get_i32("i32_").unwrap(), -1);
    }

    let bytes = buffer.as_bytes();
    assert_eq!(u32_at(bytes, 4), u32::MAX);
    assert_eq!(f32_at(bytes, 8), 0.25);
}

#[test]
fn fractional_values_truncate_in_integer_fields() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    let mut view = buffer.view_mut();
    view.set("u32_", 7.9).unwrap();
    view.set("i32_", -7.9).unwrap();
    assert_eq!(view.get_u32("u32_").unwrap(), 7);
    assert_eq!(view.get_i32("i32_").unwrap(), -7);
}

#[test]
fn typed_accessors_check_the_kind() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    let mut view = buffer.view_mut();
    assert!(matches!(view.set_u32("f32_", 1), Err(TesseraError::FieldKindMismatch { .. })));
    assert!(matches!(view.get("vec3_"), Err(TesseraError::NotAScalar { .. })));
    assert!(matches!(view.set("missing", 1.0), Err(TesseraError::UnknownField { .. })));
}

// ============================================================================
// Windows
// ============================================================================

#[test]
fn vector_windows_share_storage() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    {
        let mut view = buffer.view_mut();
        let window = view.window_mut::<f32>("vec3_").unwrap();
        assert_eq!(window.len(), 3);
        window[0] = 1.0;
        window[2] = 3.0;
        assert_eq!(view.window::<f32>("vec3_").unwrap(), &[1.0, 0.0, 3.0]);
    }

    let bytes = buffer.as_bytes();
    assert_eq!(f32_at(bytes, 32), 1.0);
    assert_eq!(f32_at(bytes, 40), 3.0);
}

#[test]
fn matrix_windows_have_padded_length() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    let mut view = buffer.view_mut();
    assert_eq!(view.window_mut::<f32>("mat3_").unwrap().len(), 12);
    assert_eq!(view.window_mut::<f32>("mat4_").unwrap().len(), 16);
    assert_eq!(view.window_mut::<f32>("vec2_").unwrap().len(), 2);
}

#[test]
fn replacing_a_window_is_rejected() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    let mut view = buffer.view_mut();
    assert_eq!(
        view.set("vec4_", 1.0),
        Err(TesseraError::ImmutableWrite {
            path: "vec4_".to_string()
        })
    );
    assert!(matches!(view.set("mat4_", 0.0), Err(TesseraError::ImmutableWrite { .. })));
}

#[test]
fn glam_helpers_write_through_windows() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    let m4 = Mat4::from_cols_array(&std::array::from_fn(|i| i as f32));
    let m3 = Mat3::from_cols(Vec3::X, Vec3::Y * 2.0, Vec3::Z * 3.0);
    {
        let mut view = buffer.view_mut();
        view.set_vec4("vec4_", Vec4::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        view.set_mat4("mat4_", m4).unwrap();
        view.set_mat3("mat3_", m3).unwrap();

        assert_eq!(view.as_view().vec4("vec4_").unwrap(), Vec4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(view.as_view().mat4("mat4_").unwrap(), m4);
        assert_eq!(view.as_view().mat3("mat3_").unwrap(), m3);
        assert_eq!(
            view.window::<f32>("mat3_").unwrap(),
            &[1.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0]
        );
    }
    assert_eq!(f32_at(buffer.as_bytes(), 112 + 4 * 15), 15.0);
}

#[test]
fn glam_helpers_check_the_shape() {
    let mut buffer = StructBuffer::new(all_primitives()).unwrap();
    let mut view = buffer.view_mut();
    assert!(matches!(
        view.set_vec3("vec4_", Vec3::ONE),
        Err(TesseraError::FieldKindMismatch { .. })
    ));
}

#[test]
fn integer_vector_windows() {
    let desc = StructDescriptor::new()
        .with("cell", Primitive::VEC3_U32)
        .with("delta", Primitive::VEC2_I32);
    let mut buffer = StructBuffer::new(desc).unwrap();
    let mut view = buffer.view_mut();
    view.window_mut::<u32>("cell").unwrap().copy_from_slice(&[1, 2, 3]);
    view.window_mut::<i32>("delta").unwrap().copy_from_slice(&[-1, 1]);
    assert!(view.window_mut::<f32>("cell").is_err());
    assert_eq!(view.window::<i32>("delta").unwrap(), &[-1, 1]);
}

// ============================================================================
// Nested structs and arrays
// ============================================================================

#[test]
fn array_elements_are_views_at_stride_offsets() {
    let mut buffer = StructBuffer::new(lights()).unwrap();
    {
        let mut view = buffer.view_mut();
        view.set("lightCount", 2.0).unwrap();
        let mut array = view.array_mut("lights").unwrap();
        assert_eq!(array.len(), 4);
        assert_eq!(array.stride(), 32);

        let mut second = array.get_mut(1).unwrap();
        second.set("range", 10.0).unwrap();
        second.set_vec3("color", Vec3::new(1.0, 0.5, 0.25)).unwrap();
    }

    let bytes = buffer.as_bytes();
    assert_eq!(u32_at(bytes, 12), 2);
    // lights[1] starts at 16 + 32
    assert_eq!(f32_at(bytes, 48 + 12), 10.0);
    assert_eq!(f32_at(bytes, 48 + 20), 0.5);

    let view = buffer.view();
    let ranges: Vec<f64> = view
        .array("lights")
        .unwrap()
        .iter()
        .map(|light| light.get("range").unwrap())
        .collect();
    assert_eq!(ranges, [0.0, 10.0, 0.0, 0.0]);
}

#[test]
fn array_index_out_of_range() {
    let mut buffer = StructBuffer::new(lights()).unwrap();
    let mut view = buffer.view_mut();
    let mut array = view.array_mut("lights").unwrap();
    assert_eq!(
        array.get_mut(4).err(),
        Some(TesseraError::IndexOutOfRange {
            path: "lights".to_string(),
            index: 4,
            len: 4
        })
    );
}

#[test]
fn for_each_visits_every_element() {
    let mut buffer = StructBuffer::new(lights()).unwrap();
    {
        let mut view = buffer.view_mut();
        view.array_mut("lights")
            .unwrap()
            .try_for_each(|i, mut light| light.set("intensity", i as f64 + 1.0))
            .unwrap();
    }
    let view = buffer.view();
    assert_eq!(view.get_path("lights[3].intensity").unwrap(), 4.0);
}

#[test]
fn composite_fields_cannot_be_assigned() {
    let inner = StructDescriptor::new().with("x", Primitive::F32);
    let desc = StructDescriptor::new()
        .with("inner", FieldType::nested(inner))
        .with("items", FieldType::array(light(), 2));
    let mut buffer = StructBuffer::new(desc).unwrap();
    let mut view = buffer.view_mut();

    assert!(matches!(view.set("inner", 1.0), Err(TesseraError::ImmutableWrite { .. })));
    assert!(matches!(view.set("items", 1.0), Err(TesseraError::ImmutableWrite { .. })));
    assert!(matches!(view.set_path("items[1]", 1.0), Err(TesseraError::ImmutableWrite { .. })));

    view.field_mut("inner").unwrap().set("x", 3.5).unwrap();
    assert_eq!(view.get_path("inner.x").unwrap(), 3.5);
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn path_access() {
    let mut buffer = StructBuffer::new(lights()).unwrap();
    let mut view = buffer.view_mut();

    view.set_path("lights[2].range", 25.0).unwrap();
    view.window_path_mut::<f32>("lights[2].position")
        .unwrap()
        .copy_from_slice(&[1.0, 2.0, 3.0]);

    assert_eq!(view.get_path("lights[2].range").unwrap(), 25.0);
    assert!(view.as_view().field("lights").is_err());
    assert_eq!(
        view.as_view().array("lights").unwrap().get(2).unwrap().vec3("position").unwrap(),
        Vec3::new(1.0, 2.0, 3.0)
    );
}

#[test]
fn path_errors() {
    let mut buffer = StructBuffer::new(lights()).unwrap();
    let mut view = buffer.view_mut();

    assert!(matches!(
        view.set_path("lights[4].range", 1.0),
        Err(TesseraError::IndexOutOfRange { index: 4, len: 4, .. })
    ));
    assert!(matches!(view.get_path("lights.range"), Err(TesseraError::InvalidPath { .. })));
    assert!(matches!(view.get_path("ambient[0]"), Err(TesseraError::InvalidPath { .. })));
    assert!(matches!(view.get_path("lights[x]"), Err(TesseraError::InvalidPath { .. })));
    assert!(matches!(view.get_path("lights[0].nope"), Err(TesseraError::UnknownField { .. })));
    assert!(matches!(view.get_path("ambient"), Err(TesseraError::NotAScalar { .. })));
}

#[test]
fn random_scalars_round_trip() {
    let item = StructDescriptor::new()
        .with("n", Primitive::U32)
        .with("v", Primitive::VEC3_F32);
    let desc = StructDescriptor::new()
        .with("u", Primitive::U32)
        .with("i", Primitive::I32)
        .with("f", Primitive::F32)
        .with("items", FieldType::array(item, 4));
    let mut buffer = StructBuffer::new(desc).unwrap();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..512 {
        let u: u32 = rng.random();
        let i: i32 = rng.random();
        let f: f32 = rng.random_range(-1.0e6..1.0e6);
        let slot = rng.random_range(0..4);
        let n: u32 = rng.random();

        let mut view = buffer.view_mut();
        view.set("u", f64::from(u)).unwrap();
        view.set("i", f64::from(i)).unwrap();
        view.set("f", f64::from(f)).unwrap();
        view.set_path(&format!("items[{slot}].n"), f64::from(n)).unwrap();
        drop(view);

        let view = buffer.view();
        assert_eq!(view.get_u32("u").unwrap(), u);
        assert_eq!(view.get_i32("i").unwrap(), i);
        assert_eq!(view.get_f32("f").unwrap(), f);
        assert_eq!(view.get_path(&format!("items[{slot}].n")).unwrap(), f64::from(n));
    }
}

#[test]
fn random_out_of_range_integers_wrap() {
    let desc = StructDescriptor::new()
        .with("u", Primitive::U32)
        .with("i", Primitive::I32);
    let mut buffer = StructBuffer::new(desc).unwrap();
    let mut rng = StdRng::seed_from_u64(32);

    for _ in 0..512 {
        // Exactly representable in f64, well outside 32 bits.
        let wide: i64 = rng.random_range(-(1i64 << 50)..(1i64 << 50));

        let mut view = buffer.view_mut();
        view.set("u", wide as f64).unwrap();
        view.set("i", wide as f64).unwrap();
        drop(view);

        let view = buffer.view();
        assert_eq!(view.get_u32("u").unwrap(), wide.rem_euclid(1 << 32) as u32);
        assert_eq!(view.get_i32("i").unwrap(), wide as i32);
    }
}

// ============================================================================
// ViewBuilder over caller memory
// ============================================================================

#[test]
fn builder_over_caller_memory_with_base_offset() {
    let desc = lights();
    let layout = desc.layout(Packing::Standard).unwrap();
    let mut words = vec![0u32; (32 + layout.size()) / 4];
    let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words[..]);

    let mut view = ViewBuilder::new(&layout).base_offset(32).build_mut(bytes).unwrap();
    view.set("lightCount", 9.0).unwrap();
    assert_eq!(view.byte_offset(), 32);
    assert_eq!(view.as_view().offset_of("lights").unwrap(), 48);
    drop(view);

    assert_eq!(words[(32 + 12) / 4], 9);
}

#[test]
fn builder_guards() {
    let desc = lights();
    let layout = desc.layout(Packing::Standard).unwrap();
    let words = vec![0u32; 64];
    let bytes: &[u8] = bytemuck::cast_slice(&words[..]);

    assert!(matches!(
        ViewBuilder::new(&layout).build(&bytes[..100]),
        Err(TesseraError::BufferTooSmall {
            required: 144,
            available: 100
        })
    ));
    assert!(matches!(
        ViewBuilder::new(&layout).base_offset(8).build(bytes),
        Err(TesseraError::AlignmentViolation { .. })
    ));
    assert!(matches!(
        ViewBuilder::new(&layout).base_offset(2).build(bytes),
        Err(TesseraError::AlignmentViolation { .. })
    ));
    assert!(ViewBuilder::new(&layout).base_offset(16).build(bytes).is_ok());
}

// ============================================================================
// Runtime arrays and packed buffers
// ============================================================================

#[test]
fn runtime_array_buffer() {
    let desc = StructDescriptor::new()
        .with("count", Primitive::U32)
        .with("items", FieldType::runtime_array(light()));
    let mut buffer = StructBuffer::with_runtime_len(desc, 5).unwrap();
    assert_eq!(buffer.byte_len(), 16 + 5 * 32);

    let mut view = buffer.view_mut();
    view.set_path("items[4].intensity", 2.0).unwrap();
    assert!(view.set_path("items[5].intensity", 2.0).is_err());
    drop(view);

    assert_eq!(f32_at(buffer.as_bytes(), 16 + 4 * 32 + 28), 2.0);
}

#[test]
fn runtime_len_overflow_fails_construction() {
    let desc = StructDescriptor::new()
        .with("count", Primitive::U32)
        .with("items", FieldType::runtime_array(light()));
    let err = StructBuffer::with_runtime_len(desc.clone(), usize::MAX / 8).unwrap_err();
    assert_eq!(err, TesseraError::Layout(LayoutError::SizeOverflow { path: "<root>".into() }));

    // Base offset plus a tail that fits on its own.
    let layout = desc.layout(Packing::Standard).unwrap();
    let words = vec![0u32; 16];
    let bytes: &[u8] = bytemuck::cast_slice(&words[..]);
    let builder = ViewBuilder::new(&layout).runtime_len(usize::MAX / 32).base_offset(32);
    assert!(builder.required_len().is_ok());
    assert!(matches!(
        builder.build(bytes),
        Err(TesseraError::Layout(LayoutError::SizeOverflow { .. }))
    ));
}

#[test]
fn packed_buffer_has_no_padding() {
    let desc = StructDescriptor::new()
        .with("position", Primitive::VEC3_F32)
        .with("uv", Primitive::VEC2_F32)
        .with("id", Primitive::U32);
    let mut buffer = StructBuffer::packed(desc).unwrap();
    assert_eq!(buffer.byte_len(), 24);

    let mut view = buffer.view_mut();
    view.set_vec3("position", Vec3::new(1.0, 2.0, 3.0)).unwrap();
    view.set("id", 7.0).unwrap();
    drop(view);

    let bytes = buffer.as_bytes();
    assert_eq!(f32_at(bytes, 8), 3.0);
    assert_eq!(u32_at(bytes, 20), 7);
}
