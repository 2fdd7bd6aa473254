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

//! Conversions from Myre's renderer types into their `wgpu` counterparts.

use myre_core::math::{Extent2D, LinearRgba};
use myre_core::renderer::{
    BlendState, DepthFormat, DepthStencilState, RasterizerState, SampleCount, TextureFormat,
};

/// A local extension trait to convert our engine's types into WGPU-compatible types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a WGPU-compatible type.
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::Extent3d> for Extent2D {
    fn into_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl IntoWgpu<wgpu::Color> for LinearRgba {
    fn into_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl IntoWgpu<wgpu::TextureFormat> for TextureFormat {
    fn into_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Rgb10a2Unorm => wgpu::TextureFormat::Rgb10a2Unorm,
            TextureFormat::R16Float => wgpu::TextureFormat::R16Float,
            TextureFormat::Rg16Float => wgpu::TextureFormat::Rg16Float,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
            TextureFormat::Rg32Float => wgpu::TextureFormat::Rg32Float,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        }
    }
}

/// `DepthFormat::None` has no texture behind it.
impl IntoWgpu<Option<wgpu::TextureFormat>> for DepthFormat {
    fn into_wgpu(self) -> Option<wgpu::TextureFormat> {
        match self {
            DepthFormat::None => None,
            DepthFormat::Depth16Unorm => Some(wgpu::TextureFormat::Depth16Unorm),
            DepthFormat::Depth24Plus => Some(wgpu::TextureFormat::Depth24Plus),
            DepthFormat::Depth24PlusStencil8 => Some(wgpu::TextureFormat::Depth24PlusStencil8),
            DepthFormat::Depth32Float => Some(wgpu::TextureFormat::Depth32Float),
        }
    }
}

impl IntoWgpu<u32> for SampleCount {
    fn into_wgpu(self) -> u32 {
        self.count()
    }
}

/// `BlendState::Opaque` disables blending entirely.
impl IntoWgpu<Option<wgpu::BlendState>> for BlendState {
    fn into_wgpu(self) -> Option<wgpu::BlendState> {
        match self {
            BlendState::Opaque => None,
            BlendState::AlphaBlend => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            BlendState::NonPremultiplied => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendState::Additive => {
                let add = wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                };
                Some(wgpu::BlendState {
                    color: add,
                    alpha: add,
                })
            }
        }
    }
}

impl IntoWgpu<Option<wgpu::Face>> for RasterizerState {
    fn into_wgpu(self) -> Option<wgpu::Face> {
        // Front faces are counter-clockwise.
        match self {
            RasterizerState::CullCounterClockwise => Some(wgpu::Face::Front),
            RasterizerState::CullClockwise => Some(wgpu::Face::Back),
            RasterizerState::CullNone => None,
        }
    }
}

/// Builds the depth/stencil state a pipeline drawing into a target with
/// `format` should use. Targets without depth never get one.
pub fn depth_stencil_state(
    state: DepthStencilState,
    format: DepthFormat,
) -> Option<wgpu::DepthStencilState> {
    let format: Option<wgpu::TextureFormat> = format.into_wgpu();
    let (depth_write_enabled, depth_compare) = match state {
        DepthStencilState::Default => (true, wgpu::CompareFunction::LessEqual),
        DepthStencilState::DepthRead => (false, wgpu::CompareFunction::LessEqual),
        DepthStencilState::None => (false, wgpu::CompareFunction::Always),
    };
    format.map(|format| wgpu::DepthStencilState {
        format,
        depth_write_enabled: Some(depth_write_enabled),
        depth_compare: Some(depth_compare),
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_format_none_has_no_texture() {
        let none: Option<wgpu::TextureFormat> = DepthFormat::None.into_wgpu();
        assert_eq!(none, None);
        let stencil: Option<wgpu::TextureFormat> = DepthFormat::Depth24PlusStencil8.into_wgpu();
        assert_eq!(stencil, Some(wgpu::TextureFormat::Depth24PlusStencil8));
    }

    #[test]
    fn test_opaque_disables_blending() {
        let opaque: Option<wgpu::BlendState> = BlendState::Opaque.into_wgpu();
        assert!(opaque.is_none());

        let additive: Option<wgpu::BlendState> = BlendState::Additive.into_wgpu();
        let additive = additive.unwrap();
        assert_eq!(additive.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(additive.color.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn test_depth_read_keeps_the_test_without_writing() {
        let state =
            depth_stencil_state(DepthStencilState::DepthRead, DepthFormat::Depth32Float).unwrap();
        assert!(!state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::LessEqual);

        assert!(depth_stencil_state(DepthStencilState::Default, DepthFormat::None).is_none());
    }

    #[test]
    fn test_clear_colour_is_widened() {
        let colour: wgpu::Color = LinearRgba::new(0.5, 0.25, 1.0, 0.0).into_wgpu();
        assert_eq!(colour.r, 0.5);
        assert_eq!(colour.g, 0.25);
        assert_eq!(colour.a, 0.0);
    }
}
