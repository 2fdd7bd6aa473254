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

use crate::error::TargetError;
use myre_core::math::Extent2D;
use myre_core::renderer::{
    full_mip_chain, DepthFormat, RenderTargetDescriptor, RenderTargetUsage, SampleCount,
    TextureFormat,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::hash::{Hash, Hasher};

/// The shape of a render target.
///
/// A width or height of `0` means "automatic": the dimension is filled in from
/// the current view resolution when a target is requested, never when the info
/// is declared. Two infos describe interchangeable targets when every field
/// except the debug [`label`](Self::label) is equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderTargetInfo {
    /// Width in pixels, `0` for automatic.
    pub width: u32,
    /// Height in pixels, `0` for automatic.
    pub height: u32,
    /// Colour surface format.
    pub format: TextureFormat,
    /// Depth buffer format.
    #[serde(default)]
    pub depth_format: DepthFormat,
    /// Multisample count. `0` means no multisampling and is a different shape
    /// from any positive count.
    #[serde(default)]
    pub multisample_count: u8,
    /// Whether the target carries a full mip chain.
    #[serde(default)]
    pub mip_map: bool,
    /// Content preservation hint.
    #[serde(default)]
    pub usage: RenderTargetUsage,
    /// Debug label. Not part of the shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RenderTargetInfo {
    /// A target of a fixed size.
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            ..Default::default()
        }
    }

    /// A target sized to the view resolution.
    pub fn auto(format: TextureFormat) -> Self {
        Self::new(0, 0, format)
    }

    /// Sets the depth format.
    pub fn with_depth(mut self, depth_format: DepthFormat) -> Self {
        self.depth_format = depth_format;
        self
    }

    /// Sets the multisample count.
    pub fn with_multisample(mut self, count: u8) -> Self {
        self.multisample_count = count;
        self
    }

    /// Enables or disables the mip chain.
    pub fn with_mip_map(mut self, mip_map: bool) -> Self {
        self.mip_map = mip_map;
        self
    }

    /// Sets the usage hint.
    pub fn with_usage(mut self, usage: RenderTargetUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Sets the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns `true` if either dimension is automatic.
    pub fn is_auto(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Replaces automatic dimensions with the given ones. Every other field is
    /// passed through, so resolving an already resolved info changes nothing.
    pub fn resolve(&self, width: u32, height: u32) -> Self {
        Self {
            width: if self.width == 0 { width } else { self.width },
            height: if self.height == 0 { height } else { self.height },
            ..self.clone()
        }
    }

    /// [`resolve`](Self::resolve) against an extent.
    pub fn resolve_to(&self, size: Extent2D) -> Self {
        self.resolve(size.width, size.height)
    }

    /// The size of a resolved target.
    pub fn size(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }

    /// Builds the device descriptor of a resolved target.
    ///
    /// # Errors
    /// [`TargetError::Unresolved`] while a dimension is still automatic, and
    /// [`TargetError::UnsupportedMultisample`] for counts the device cannot use.
    pub fn descriptor(&self) -> Result<RenderTargetDescriptor<'_>, TargetError> {
        if self.is_auto() {
            return Err(TargetError::Unresolved {
                width: self.width,
                height: self.height,
            });
        }
        let sample_count = SampleCount::from_count(u32::from(self.multisample_count))
            .ok_or(TargetError::UnsupportedMultisample(self.multisample_count))?;

        Ok(RenderTargetDescriptor {
            label: self.label.as_deref().map(Cow::Borrowed),
            size: self.size(),
            format: self.format,
            depth_format: self.depth_format,
            sample_count,
            mip_level_count: if self.mip_map {
                full_mip_chain(self.size())
            } else {
                1
            },
            usage: self.usage,
        })
    }

    #[allow(clippy::type_complexity)]
    fn shape(
        &self,
    ) -> (
        u32,
        u32,
        TextureFormat,
        DepthFormat,
        u8,
        bool,
        RenderTargetUsage,
    ) {
        (
            self.width,
            self.height,
            self.format,
            self.depth_format,
            self.multisample_count,
            self.mip_map,
            self.usage,
        )
    }
}

impl PartialEq for RenderTargetInfo {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }
}

impl Eq for RenderTargetInfo {}

impl Hash for RenderTargetInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape().hash(state);
    }
}
