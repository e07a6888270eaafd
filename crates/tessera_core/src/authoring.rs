//! JSON authoring of struct descriptors.
//!
//! The text form mirrors how descriptors are written by hand:
//!
//! ```json
//! {
//!   "ambient": "vec3_f32",
//!   "lightCount": "u32",
//!   "lights": [{ "position": "vec3_f32", "range": "f32" }, 4],
//!   "extra": [{ "x": "u32" }]
//! }
//! ```
//!
//! A string is a primitive (`vec3_f32` or `vec3<f32>`), an object is a
//! nested struct, `[struct, N]` is a fixed array and `[struct]` (or
//! `[struct, null]`) is a runtime-sized array. An optional third element
//! `true` also marks the array runtime-sized; its length is then ignored,
//! since runtime element counts are chosen when a buffer is allocated.
//! Object key order is the field declaration order.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::descriptor::{ArrayLength, FieldType, Primitive, StructDescriptor};
use crate::errors::{LayoutError, Result};

impl StructDescriptor {
    /// Parses a descriptor from its JSON text form.
    ///
    /// Only the syntax is checked here; layout rules are enforced when the
    /// layout is computed.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| LayoutError::Parse(e.to_string()).into())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LayoutError::Parse(e.to_string()).into())
    }
}

// ============================================================================
// Deserialize
// ============================================================================

struct StructVisitor;

impl<'de> Visitor<'de> for StructVisitor {
    type Value = StructDescriptor;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a struct descriptor object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut desc = StructDescriptor::new();
        while let Some((name, ty)) = map.next_entry::<String, FieldType>()? {
            desc.push(name, ty);
        }
        Ok(desc)
    }
}

impl<'de> Deserialize<'de> for StructDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(StructVisitor)
    }
}

struct FieldTypeVisitor;

impl<'de> Visitor<'de> for FieldTypeVisitor {
    type Value = FieldType;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a primitive name, a struct object or an [struct, length, runtimeSized] array")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        v.parse::<Primitive>().map(FieldType::Primitive).map_err(E::custom)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Self::Value, A::Error> {
        StructVisitor.visit_map(map).map(FieldType::nested)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let element: StructDescriptor = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let length = match seq.next_element::<Option<usize>>()? {
            Some(Some(n)) => ArrayLength::Fixed(n),
            Some(None) | None => ArrayLength::Runtime,
        };
        let length = match seq.next_element::<bool>()? {
            Some(true) => ArrayLength::Runtime,
            Some(false) | None => length,
        };
        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(4, &self));
        }
        Ok(FieldType::Array {
            element: element.into(),
            length,
        })
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(FieldTypeVisitor)
    }
}

// ============================================================================
// Serialize
// ============================================================================

impl Serialize for StructDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, ty) in self.fields() {
            map.serialize_entry(name, ty)?;
        }
        map.end()
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldType::Primitive(p) => serializer.serialize_str(&p.token()),
            FieldType::Struct(desc) => desc.serialize(serializer),
            FieldType::Array { element, length } => match length {
                ArrayLength::Fixed(n) => {
                    let mut seq = serializer.serialize_seq(Some(2))?;
                    seq.serialize_element(element.as_ref())?;
                    seq.serialize_element(n)?;
                    seq.end()
                }
                ArrayLength::Runtime => {
                    let mut seq = serializer.serialize_seq(Some(1))?;
                    seq.serialize_element(element.as_ref())?;
                    seq.end()
                }
            },
        }
    }
}
