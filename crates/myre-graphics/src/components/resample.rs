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

use crate::component::{DrawContext, InitialiseContext, RendererComponent};
use crate::error::PlanError;
use crate::render_target::RenderTargetInfo;
use crate::resource::ResourceContext;
use myre_core::renderer::RenderError;

/// Copies a resource into a new one, scaled by a constant factor.
#[derive(Debug, Clone)]
pub struct ResampleComponent {
    input: String,
    output: String,
    scale: f32,
    format: RenderTargetInfo,
}

impl ResampleComponent {
    /// Resamples `input` into `output`. A `scale` of 0.5 halves both dimensions.
    pub fn new(input: impl Into<String>, output: impl Into<String>, scale: f32) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            scale,
            format: RenderTargetInfo::default(),
        }
    }

    fn scaled(&self, size: u32) -> u32 {
        ((size as f32 * self.scale).round() as u32).max(1)
    }
}

impl RendererComponent for ResampleComponent {
    fn name(&self) -> &str {
        "resample"
    }

    fn initialise(
        &mut self,
        _cx: &InitialiseContext<'_>,
        resources: &mut ResourceContext,
    ) -> Result<(), PlanError> {
        resources.define_input(&self.input)?;
        let source = resources
            .available(&self.input)
            .map(|resource| resource.format.clone())
            .unwrap_or_default();

        // Sized at draw time, from the actual input.
        self.format = RenderTargetInfo {
            width: 0,
            height: 0,
            label: Some(self.output.clone()),
            ..source
        };
        resources.define_output(&self.output, false, None, self.format.clone())
    }

    fn draw(&mut self, cx: &mut DrawContext<'_>) -> Result<(), RenderError> {
        let source = cx.resource(&self.input)?;
        let size = cx.device.render_target_size(source)?;
        let info = self
            .format
            .resolve(self.scaled(size.width), self.scaled(size.height));

        let target = cx.get_target(&info)?;
        cx.device.resample(source, target)?;
        cx.output(&self.output, target)
    }
}
