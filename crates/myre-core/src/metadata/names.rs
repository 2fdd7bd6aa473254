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

//! Well-known metadata entries shared by the renderer, views and components.

use super::MetadataKey;
use crate::renderer::api::TextureId;
use glam::{Mat4, Vec2};

/// Size in pixels of the surface the current view renders at.
pub const RESOLUTION: MetadataKey<Vec2> = MetadataKey::new("resolution");
/// World to view transform of the active camera.
pub const VIEW: MetadataKey<Mat4> = MetadataKey::new("view");
/// Projection of the active camera.
pub const PROJECTION: MetadataKey<Mat4> = MetadataKey::new("projection");
/// `projection * view`.
pub const VIEW_PROJECTION: MetadataKey<Mat4> = MetadataKey::new("viewprojection");
/// Inverse of [`VIEW`].
pub const INVERSE_VIEW: MetadataKey<Mat4> = MetadataKey::new("inverseview");
/// Inverse of [`PROJECTION`].
pub const INVERSE_PROJECTION: MetadataKey<Mat4> = MetadataKey::new("inverseprojection");
/// Near clip distance of the active camera.
pub const NEAR_CLIP: MetadataKey<f32> = MetadataKey::new("nearclip");
/// Far clip distance of the active camera.
pub const FAR_CLIP: MetadataKey<f32> = MetadataKey::new("farclip");
/// Seconds elapsed since the previous frame.
pub const TIME_DELTA: MetadataKey<f32> = MetadataKey::new("timedelta");
/// Whether screen space ambient occlusion is enabled.
pub const SSAO: MetadataKey<bool> = MetadataKey::new("ssao");
/// Linear depth target of the geometry buffer.
pub const GBUFFER_DEPTH: MetadataKey<Option<TextureId>> = MetadataKey::new("gbuffer_depth");
/// Normal target of the geometry buffer.
pub const GBUFFER_NORMALS: MetadataKey<Option<TextureId>> = MetadataKey::new("gbuffer_normals");
/// Diffuse albedo target of the geometry buffer.
pub const GBUFFER_DIFFUSE: MetadataKey<Option<TextureId>> = MetadataKey::new("gbuffer_diffuse");
/// HDR light accumulation target.
pub const LIGHTBUFFER: MetadataKey<Option<TextureId>> = MetadataKey::new("lightbuffer");
