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

//! Defines data structures related to GPU render targets.

use crate::math::Extent2D;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Defines the memory format of the colour surface of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// One 8-bit unsigned normalized component.
    R8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA).
    #[default]
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in the sRGB color space.
    Rgba8UnormSrgb,
    /// Four 8-bit unsigned normalized components (BGRA) in the sRGB color space.
    /// This is a common swapchain format.
    Bgra8UnormSrgb,
    /// Three 10-bit components and a 2-bit alpha, used for packed normals.
    Rgb10a2Unorm,
    /// One 16-bit float component.
    R16Float,
    /// Two 16-bit float components.
    Rg16Float,
    /// Four 16-bit float components. The usual HDR light accumulation format.
    Rgba16Float,
    /// One 32-bit float component. Used for linear depth.
    R32Float,
    /// Two 32-bit float components.
    Rg32Float,
    /// Four 32-bit float components.
    Rgba32Float,
}

impl TextureFormat {
    /// Returns the size in bytes of a single pixel for this format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgba8UnormSrgb => 4,
            TextureFormat::Bgra8UnormSrgb => 4,
            TextureFormat::Rgb10a2Unorm => 4,
            TextureFormat::R16Float => 2,
            TextureFormat::Rg16Float => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::R32Float => 4,
            TextureFormat::Rg32Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }

    /// Returns `true` for floating point formats.
    ///
    /// Floating point images cannot be linearly filtered on every device, so
    /// they are always sampled with point filtering when composited.
    pub fn is_floating_point(&self) -> bool {
        matches!(
            self,
            TextureFormat::R16Float
                | TextureFormat::Rg16Float
                | TextureFormat::Rgba16Float
                | TextureFormat::R32Float
                | TextureFormat::Rg32Float
                | TextureFormat::Rgba32Float
        )
    }
}

/// The depth/stencil buffer attached to a render target, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthFormat {
    /// No depth buffer.
    #[default]
    None,
    /// A 16-bit unsigned normalized depth buffer.
    Depth16Unorm,
    /// A depth buffer of at least 24 bits.
    Depth24Plus,
    /// A depth buffer of at least 24 bits with an 8-bit stencil component.
    Depth24PlusStencil8,
    /// A 32-bit float depth buffer.
    Depth32Float,
}

impl DepthFormat {
    /// Returns `true` if a depth buffer is attached.
    pub fn has_depth(&self) -> bool {
        !matches!(self, DepthFormat::None)
    }

    /// Returns `true` if the buffer carries a stencil component.
    pub fn has_stencil(&self) -> bool {
        matches!(self, DepthFormat::Depth24PlusStencil8)
    }

    /// Size in bytes of a single depth texel, `0` for [`DepthFormat::None`].
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            DepthFormat::None => 0,
            DepthFormat::Depth16Unorm => 2,
            DepthFormat::Depth24Plus => 4,
            DepthFormat::Depth24PlusStencil8 => 4,
            DepthFormat::Depth32Float => 4,
        }
    }
}

/// The number of samples per pixel for Multisample Anti-Aliasing (MSAA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleCount {
    /// 1 sample per pixel (MSAA disabled).
    #[default]
    X1,
    /// 2 samples per pixel.
    X2,
    /// 4 samples per pixel.
    X4,
    /// 8 samples per pixel.
    X8,
    /// 16 samples per pixel.
    X16,
}

impl SampleCount {
    /// Converts a raw multisample count. `0` and `1` both mean "no multisampling".
    ///
    /// Returns `None` for counts the device cannot represent.
    pub fn from_count(count: u32) -> Option<Self> {
        match count {
            0 | 1 => Some(SampleCount::X1),
            2 => Some(SampleCount::X2),
            4 => Some(SampleCount::X4),
            8 => Some(SampleCount::X8),
            16 => Some(SampleCount::X16),
            _ => None,
        }
    }

    /// The number of samples as an integer.
    pub fn count(&self) -> u32 {
        match self {
            SampleCount::X1 => 1,
            SampleCount::X2 => 2,
            SampleCount::X4 => 4,
            SampleCount::X8 => 8,
            SampleCount::X16 => 16,
        }
    }
}

/// What happens to the contents of a render target when it is bound again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderTargetUsage {
    /// The contents are undefined after rebinding.
    #[default]
    DiscardContents,
    /// The contents are preserved across rebinding.
    PreserveContents,
    /// Whatever the platform does natively.
    PlatformContents,
}

/// Describes a render target to be created by a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor<'a> {
    /// Debug label, visible in GPU debuggers.
    pub label: Option<Cow<'a, str>>,
    /// Size of the target in pixels. Must not be empty.
    pub size: Extent2D,
    /// Format of the colour surface.
    pub format: TextureFormat,
    /// Format of the attached depth buffer.
    pub depth_format: DepthFormat,
    /// Multisample count.
    pub sample_count: SampleCount,
    /// Number of mip levels, at least 1.
    pub mip_level_count: u32,
    /// Content preservation behaviour.
    pub usage: RenderTargetUsage,
}

impl RenderTargetDescriptor<'_> {
    /// Approximate GPU memory occupied by a target of this shape.
    pub fn size_in_bytes(&self) -> u64 {
        let texels = self.size.width as u64 * self.size.height as u64;
        let per_texel = self.format.bytes_per_pixel() + self.depth_format.bytes_per_pixel();
        texels * per_texel as u64 * self.sample_count.count() as u64
    }
}

/// Number of mip levels of a full chain for a surface of the given size.
pub fn full_mip_chain(size: Extent2D) -> u32 {
    let largest = size.width.max(size.height).max(1);
    32 - largest.leading_zeros()
}

/// An opaque handle to a render target owned by a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_from_raw() {
        assert_eq!(SampleCount::from_count(0), Some(SampleCount::X1));
        assert_eq!(SampleCount::from_count(1), Some(SampleCount::X1));
        assert_eq!(SampleCount::from_count(4), Some(SampleCount::X4));
        assert_eq!(SampleCount::from_count(3), None);
        assert_eq!(SampleCount::X8.count(), 8);
    }

    #[test]
    fn mip_chain_length() {
        assert_eq!(full_mip_chain(Extent2D::new(1, 1)), 1);
        assert_eq!(full_mip_chain(Extent2D::new(256, 64)), 9);
        assert_eq!(full_mip_chain(Extent2D::new(1024, 768)), 11);
    }

    #[test]
    fn floating_point_formats() {
        assert!(TextureFormat::Rgba16Float.is_floating_point());
        assert!(TextureFormat::R32Float.is_floating_point());
        assert!(!TextureFormat::Rgba8Unorm.is_floating_point());
        assert!(!TextureFormat::Rgb10a2Unorm.is_floating_point());
    }

    #[test]
    fn descriptor_size_accounts_for_depth_and_samples() {
        let descriptor = RenderTargetDescriptor {
            label: None,
            size: Extent2D::new(4, 4),
            format: TextureFormat::Rgba8Unorm,
            depth_format: DepthFormat::Depth24PlusStencil8,
            sample_count: SampleCount::X2,
            mip_level_count: 1,
            usage: RenderTargetUsage::DiscardContents,
        };
        assert_eq!(descriptor.size_in_bytes(), 16 * 8 * 2);
    }
}
