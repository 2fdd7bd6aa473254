// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The per-renderer metadata store.
//!
//! Metadata is the channel through which camera and frame parameters flow to the
//! renderer components, next to (but separate from) the named render-target
//! resources of a plan. Entries are keyed by name and hold one of a small fixed
//! set of value kinds. Reads are typed: asking for a `Mat4` under a name that
//! holds a `Vec2` is a [`MetadataError::TypeMismatch`], never a silent cast.

pub mod names;

use crate::renderer::api::TextureId;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// The kind of value stored in a metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// A boolean flag.
    Bool,
    /// A single float.
    Float,
    /// A two component vector.
    Vec2,
    /// A three component vector.
    Vec3,
    /// A four component vector.
    Vec4,
    /// A 4x4 matrix.
    Mat4,
    /// An optional render-target handle.
    Texture,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataKind::Bool => "bool",
            MetadataKind::Float => "float",
            MetadataKind::Vec2 => "vec2",
            MetadataKind::Vec3 => "vec3",
            MetadataKind::Vec4 => "vec4",
            MetadataKind::Mat4 => "mat4",
            MetadataKind::Texture => "texture",
        };
        f.write_str(name)
    }
}

/// A single metadata value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetadataValue {
    /// A boolean flag.
    Bool(bool),
    /// A single float.
    Float(f32),
    /// A two component vector.
    Vec2(Vec2),
    /// A three component vector.
    Vec3(Vec3),
    /// A four component vector.
    Vec4(Vec4),
    /// A 4x4 matrix.
    Mat4(Mat4),
    /// An optional render-target handle.
    Texture(Option<TextureId>),
}

impl MetadataValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> MetadataKind {
        match self {
            MetadataValue::Bool(_) => MetadataKind::Bool,
            MetadataValue::Float(_) => MetadataKind::Float,
            MetadataValue::Vec2(_) => MetadataKind::Vec2,
            MetadataValue::Vec3(_) => MetadataKind::Vec3,
            MetadataValue::Vec4(_) => MetadataKind::Vec4,
            MetadataValue::Mat4(_) => MetadataKind::Mat4,
            MetadataValue::Texture(_) => MetadataKind::Texture,
        }
    }
}

/// Rust types that can be stored in [`RendererMetadata`].
pub trait MetadataType: Copy {
    /// The kind of [`MetadataValue`] this type maps to.
    const KIND: MetadataKind;

    /// Wraps the value.
    fn into_value(self) -> MetadataValue;

    /// Extracts the value, or `None` if `value` holds another kind.
    fn from_value(value: &MetadataValue) -> Option<Self>;
}

macro_rules! impl_metadata_type {
    ($ty:ty, $variant:ident) => {
        impl MetadataType for $ty {
            const KIND: MetadataKind = MetadataKind::$variant;

            fn into_value(self) -> MetadataValue {
                MetadataValue::$variant(self)
            }

            fn from_value(value: &MetadataValue) -> Option<Self> {
                match value {
                    MetadataValue::$variant(inner) => Some(*inner),
                    _ => None,
                }
            }
        }
    };
}

impl_metadata_type!(bool, Bool);
impl_metadata_type!(f32, Float);
impl_metadata_type!(Vec2, Vec2);
impl_metadata_type!(Vec3, Vec3);
impl_metadata_type!(Vec4, Vec4);
impl_metadata_type!(Mat4, Mat4);
impl_metadata_type!(Option<TextureId>, Texture);

/// An error raised by a typed metadata read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// No entry exists under the name.
    Missing(String),
    /// The entry exists but holds a different kind of value.
    TypeMismatch {
        /// Name of the entry.
        name: String,
        /// Kind the caller asked for.
        expected: MetadataKind,
        /// Kind actually stored.
        found: MetadataKind,
    },
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::Missing(name) => write!(f, "No metadata entry named '{name}'"),
            MetadataError::TypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Metadata entry '{name}' holds a {found}, but a {expected} was requested"
            ),
        }
    }
}

impl std::error::Error for MetadataError {}

/// A compile-time typed name for a metadata entry.
pub struct MetadataKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MetadataKey<T> {
    /// Creates a key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The entry name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for MetadataKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MetadataKey<T> {}

impl<T> fmt::Debug for MetadataKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MetadataKey").field(&self.name).finish()
    }
}

/// A name-keyed heterogeneous store of [`MetadataValue`]s.
#[derive(Debug, Clone, Default)]
pub struct RendererMetadata {
    entries: HashMap<String, MetadataValue>,
}

impl RendererMetadata {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `name`, replacing any previous entry of any kind.
    pub fn set<T: MetadataType>(&mut self, name: &str, value: T) {
        match self.entries.get_mut(name) {
            Some(slot) => *slot = value.into_value(),
            None => {
                self.entries.insert(name.to_owned(), value.into_value());
            }
        }
    }

    /// Reads the entry under `name`.
    ///
    /// # Errors
    /// [`MetadataError::Missing`] if there is no entry, or
    /// [`MetadataError::TypeMismatch`] if it holds another kind.
    pub fn get<T: MetadataType>(&self, name: &str) -> Result<T, MetadataError> {
        self.try_get(name)?
            .ok_or_else(|| MetadataError::Missing(name.to_owned()))
    }

    /// Reads the entry under `name`, returning `Ok(None)` if there is none.
    pub fn try_get<T: MetadataType>(&self, name: &str) -> Result<Option<T>, MetadataError> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(value) => {
                T::from_value(value)
                    .map(Some)
                    .ok_or_else(|| MetadataError::TypeMismatch {
                        name: name.to_owned(),
                        expected: T::KIND,
                        found: value.kind(),
                    })
            }
        }
    }

    /// Reads the entry under `name`, falling back to `default` if there is none.
    /// A type mismatch is still an error.
    pub fn get_or<T: MetadataType>(&self, name: &str, default: T) -> Result<T, MetadataError> {
        Ok(self.try_get(name)?.unwrap_or(default))
    }

    /// Typed write through a [`MetadataKey`].
    pub fn write<T: MetadataType>(&mut self, key: MetadataKey<T>, value: T) {
        self.set(key.name(), value);
    }

    /// Typed read through a [`MetadataKey`].
    pub fn read<T: MetadataType>(&self, key: MetadataKey<T>) -> Result<T, MetadataError> {
        self.get(key.name())
    }

    /// Returns the raw value under `name`.
    pub fn value(&self, name: &str) -> Option<&MetadataValue> {
        self.entries.get(name)
    }

    /// Removes an entry, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<MetadataValue> {
        self.entries.remove(name)
    }

    /// Returns `true` if an entry exists under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every texture entry, returning how many were dropped.
    ///
    /// Texture handles are only meaningful while the plan that published them
    /// holds the targets.
    pub fn release_textures(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, value| value.kind() != MetadataKind::Texture);
        before - self.entries.len()
    }

    /// Iterates over the entry names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_read_back() {
        let mut metadata = RendererMetadata::new();
        metadata.write(names::RESOLUTION, Vec2::new(1024.0, 768.0));
        metadata.set("exposure", 1.5f32);

        assert_eq!(metadata.read(names::RESOLUTION), Ok(Vec2::new(1024.0, 768.0)));
        assert_eq!(metadata.get::<f32>("exposure"), Ok(1.5));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let mut metadata = RendererMetadata::new();
        metadata.write(names::RESOLUTION, Vec2::ONE);

        let err = metadata.get::<Mat4>("resolution").unwrap_err();
        assert_eq!(
            err,
            MetadataError::TypeMismatch {
                name: "resolution".into(),
                expected: MetadataKind::Mat4,
                found: MetadataKind::Vec2,
            }
        );
        assert_eq!(
            err.to_string(),
            "Metadata entry 'resolution' holds a vec2, but a mat4 was requested"
        );
        assert!(metadata.get_or("resolution", Mat4::IDENTITY).is_err());
    }

    #[test]
    fn releasing_textures_keeps_other_entries() {
        let mut metadata = RendererMetadata::new();
        metadata.write(names::GBUFFER_DEPTH, Some(TextureId(4)));
        metadata.write(names::LIGHTBUFFER, None);
        metadata.write(names::TIME_DELTA, 0.5);

        assert_eq!(metadata.release_textures(), 2);
        assert!(!metadata.contains("gbuffer_depth"));
        assert!(!metadata.contains("lightbuffer"));
        assert_eq!(metadata.read(names::TIME_DELTA), Ok(0.5));
    }

    #[test]
    fn missing_entries() {
        let metadata = RendererMetadata::new();
        assert_eq!(
            metadata.get::<bool>("ssao"),
            Err(MetadataError::Missing("ssao".into()))
        );
        assert_eq!(metadata.try_get::<bool>("ssao"), Ok(None));
        assert_eq!(metadata.get_or("ssao", true), Ok(true));
    }

    #[test]
    fn set_replaces_any_kind() {
        let mut metadata = RendererMetadata::new();
        metadata.set("gbuffer_depth", Some(TextureId(3)));
        metadata.set("gbuffer_depth", 2.0f32);
        assert_eq!(metadata.value("gbuffer_depth"), Some(&MetadataValue::Float(2.0)));

        metadata.write(names::GBUFFER_DEPTH, None);
        assert_eq!(metadata.read(names::GBUFFER_DEPTH), Ok(None));
        assert!(metadata.remove("gbuffer_depth").is_some());
        assert!(metadata.is_empty());
    }
}
