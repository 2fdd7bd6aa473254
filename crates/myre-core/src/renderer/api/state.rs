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

//! Fixed-function device state shared by all renderer components.
//!
//! The state set by one component stays visible to the next one. Components
//! that change it are expected to put back [`PipelineState::default`] before
//! returning from their draw.

use crate::math::LinearRgba;
use serde::{Deserialize, Serialize};

/// How fragment output is combined with the contents of the bound targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendState {
    /// Output replaces the destination.
    #[default]
    Opaque,
    /// Premultiplied alpha blending.
    AlphaBlend,
    /// Output is added to the destination. Used for light accumulation.
    Additive,
    /// Non-premultiplied alpha blending.
    NonPremultiplied,
}

/// Depth and stencil testing behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthStencilState {
    /// Depth test and depth write enabled.
    #[default]
    Default,
    /// Depth test enabled, depth write disabled.
    DepthRead,
    /// No depth test and no depth write.
    None,
}

/// Triangle culling behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RasterizerState {
    /// Cull counter-clockwise faces.
    #[default]
    CullCounterClockwise,
    /// Cull clockwise faces.
    CullClockwise,
    /// No culling.
    CullNone,
}

/// The complete fixed-function state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PipelineState {
    /// Current blend state.
    pub blend: BlendState,
    /// Current depth/stencil state.
    pub depth_stencil: DepthStencilState,
    /// Current rasterizer state.
    pub rasterizer: RasterizerState,
}

impl PipelineState {
    /// Returns a copy with a different blend state.
    pub fn with_blend(mut self, blend: BlendState) -> Self {
        self.blend = blend;
        self
    }

    /// Returns a copy with a different depth/stencil state.
    pub fn with_depth_stencil(mut self, depth_stencil: DepthStencilState) -> Self {
        self.depth_stencil = depth_stencil;
        self
    }

    /// Returns a copy with a different rasterizer state.
    pub fn with_rasterizer(mut self, rasterizer: RasterizerState) -> Self {
        self.rasterizer = rasterizer;
        self
    }
}

/// Texture filtering used when an image is sampled onto another surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SamplerFilter {
    /// Bilinear filtering.
    #[default]
    Linear,
    /// Nearest-neighbour filtering.
    Point,
}

/// Which parts of the bound targets a clear touches, and with which values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearOptions {
    /// Colour to clear the colour surfaces to, if any.
    pub color: Option<LinearRgba>,
    /// Value to clear the depth buffer to, if any.
    pub depth: Option<f32>,
    /// Value to clear the stencil buffer to, if any.
    pub stencil: Option<u32>,
}

impl ClearOptions {
    /// Clears colour only.
    pub fn color(color: LinearRgba) -> Self {
        Self {
            color: Some(color),
            depth: None,
            stencil: None,
        }
    }

    /// Clears colour, depth (to `1.0`) and stencil (to `0`).
    pub fn all(color: LinearRgba) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
            stencil: Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pipeline_state() {
        let state = PipelineState::default();
        assert_eq!(state.blend, BlendState::Opaque);
        assert_eq!(state.depth_stencil, DepthStencilState::Default);
        assert_eq!(state.rasterizer, RasterizerState::CullCounterClockwise);

        let additive = state
            .with_blend(BlendState::Additive)
            .with_depth_stencil(DepthStencilState::None);
        assert_ne!(additive, state);
        assert_eq!(additive.rasterizer, state.rasterizer);
    }

    #[test]
    fn sampler_filter_serialises_by_name() {
        assert_eq!(
            serde_json::to_string(&SamplerFilter::Point).unwrap(),
            "\"Point\""
        );
        let filter: SamplerFilter = serde_json::from_str("\"Linear\"").unwrap();
        assert_eq!(filter, SamplerFilter::Linear);
    }
}
