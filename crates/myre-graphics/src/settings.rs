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

//! Settings of the rendering system.

use myre_core::math::LinearRgba;
use myre_core::renderer::{SamplerFilter, TextureFormat};
use serde::{Deserialize, Serialize};

/// Settings that affect how the [`Renderer`](crate::Renderer) draws a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Colour the back buffer is cleared to before views are composited.
    pub clear_colour: LinearRgba,
    /// Filter used when compositing view images. Floating point images are
    /// always composited with [`SamplerFilter::Point`].
    pub composite_filter: SamplerFilter,
    /// Warn about plan resources that are produced but never used.
    pub log_dead_outputs: bool,
    /// Pool size above which every new allocation is logged as a warning.
    pub max_pooled_targets: usize,
}

impl RendererSettings {
    /// The filter to composite an image of the given format with.
    pub fn filter_for(&self, format: TextureFormat) -> SamplerFilter {
        if format.is_floating_point() {
            SamplerFilter::Point
        } else {
            self.composite_filter
        }
    }
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_colour: LinearRgba::BLACK,
            composite_filter: SamplerFilter::Linear,
            log_dead_outputs: true,
            max_pooled_targets: 64,
        }
    }
}
