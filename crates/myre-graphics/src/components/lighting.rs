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

//! Deferred light accumulation.

use super::{with_pipeline_state, GBUFFER_DEPTH, GBUFFER_DIFFUSE, GBUFFER_NORMALS, LIGHTBUFFER};
use crate::component::{DrawContext, InitialiseContext, RendererComponent};
use crate::error::PlanError;
use crate::render_target::RenderTargetInfo;
use crate::resource::ResourceContext;
use myre_core::math::LinearRgba;
use myre_core::metadata::names;
use myre_core::renderer::{
    BlendState, ClearOptions, DepthStencilState, PipelineState, RenderError, TextureFormat,
};
use myre_core::scene::LightManager;

/// Accumulates every light of the scene into [`LIGHTBUFFER`], reading the
/// gbuffer.
///
/// The gbuffer targets are published to metadata (`gbuffer_depth`,
/// `gbuffer_normals`, `gbuffer_diffuse`) so light managers can bind them.
/// Lights are drawn with additive blending and no depth test.
#[derive(Debug, Clone)]
pub struct LightingComponent {
    lightbuffer: RenderTargetInfo,
}

impl LightingComponent {
    /// A lighting pass into an HDR light buffer.
    pub fn new() -> Self {
        Self {
            lightbuffer: RenderTargetInfo::auto(TextureFormat::Rgba16Float)
                .with_label(LIGHTBUFFER),
        }
    }
}

impl Default for LightingComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererComponent for LightingComponent {
    fn name(&self) -> &str {
        "lighting"
    }

    fn initialise(
        &mut self,
        _cx: &InitialiseContext<'_>,
        resources: &mut ResourceContext,
    ) -> Result<(), PlanError> {
        resources.define_input(GBUFFER_DEPTH)?;
        resources.define_input(GBUFFER_NORMALS)?;
        resources.define_input(GBUFFER_DIFFUSE)?;
        resources.define_output(LIGHTBUFFER, true, None, self.lightbuffer.clone())
    }

    fn draw(&mut self, cx: &mut DrawContext<'_>) -> Result<(), RenderError> {
        let depth = cx.resource(GBUFFER_DEPTH)?;
        let normals = cx.resource(GBUFFER_NORMALS)?;
        let diffuse = cx.resource(GBUFFER_DIFFUSE)?;
        cx.metadata.write(names::GBUFFER_DEPTH, Some(depth));
        cx.metadata.write(names::GBUFFER_NORMALS, Some(normals));
        cx.metadata.write(names::GBUFFER_DIFFUSE, Some(diffuse));

        let light = cx.get_target(&self.lightbuffer)?;
        cx.device.set_render_targets(&[light])?;
        cx.device.clear(ClearOptions::color(LinearRgba::TRANSPARENT))?;

        let scene = cx.scene;
        let lights = scene.find_managers::<dyn LightManager>();
        for manager in lights {
            manager.prepare(cx.device, cx.metadata)?;
        }

        let additive = PipelineState::default()
            .with_blend(BlendState::Additive)
            .with_depth_stencil(DepthStencilState::None);
        let device = cx.device;
        let metadata = &*cx.metadata;
        with_pipeline_state(device, additive, || {
            lights
                .iter()
                .try_for_each(|manager| manager.draw(device, metadata))
        })?;

        cx.metadata.write(names::LIGHTBUFFER, Some(light));
        cx.output(LIGHTBUFFER, light)
    }
}
