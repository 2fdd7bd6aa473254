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

//! The geometry pass of the deferred pipeline.

use super::{GBUFFER_DEPTH, GBUFFER_DEPTH_DOWNSAMPLE, GBUFFER_DIFFUSE, GBUFFER_NORMALS};
use crate::component::{DrawContext, InitialiseContext, RendererComponent};
use crate::error::PlanError;
use crate::render_target::RenderTargetInfo;
use crate::resource::ResourceContext;
use myre_core::math::LinearRgba;
use myre_core::renderer::{ClearOptions, DepthFormat, RenderError, TextureFormat};
use myre_core::scene::GeometryProvider;

/// Phase name passed to every [`GeometryProvider`].
pub const GBUFFER_PHASE: &str = "gbuffer";

/// Renders scene geometry into the gbuffer.
///
/// Outputs [`GBUFFER_DEPTH`], [`GBUFFER_NORMALS`] and [`GBUFFER_DIFFUSE`] at
/// view resolution, then downsamples depth into [`GBUFFER_DEPTH_DOWNSAMPLE`]
/// (half resolution), which is left bound.
#[derive(Debug, Clone)]
pub struct GeometryBufferComponent {
    depth: RenderTargetInfo,
    normals: RenderTargetInfo,
    diffuse: RenderTargetInfo,
}

impl GeometryBufferComponent {
    /// Creates the component with the standard gbuffer layout.
    pub fn new() -> Self {
        Self {
            depth: RenderTargetInfo::auto(TextureFormat::R32Float)
                .with_depth(DepthFormat::Depth24PlusStencil8)
                .with_label(GBUFFER_DEPTH),
            normals: RenderTargetInfo::auto(TextureFormat::Rgb10a2Unorm)
                .with_label(GBUFFER_NORMALS),
            diffuse: RenderTargetInfo::auto(TextureFormat::Rgba8Unorm)
                .with_label(GBUFFER_DIFFUSE),
        }
    }

    fn downsample_info(&self) -> RenderTargetInfo {
        RenderTargetInfo::auto(self.depth.format).with_label(GBUFFER_DEPTH_DOWNSAMPLE)
    }
}

impl Default for GeometryBufferComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererComponent for GeometryBufferComponent {
    fn name(&self) -> &str {
        "gbuffer"
    }

    fn initialise(
        &mut self,
        _cx: &InitialiseContext<'_>,
        resources: &mut ResourceContext,
    ) -> Result<(), PlanError> {
        resources.define_output(GBUFFER_DEPTH, false, None, self.depth.clone())?;
        resources.define_output(GBUFFER_NORMALS, false, None, self.normals.clone())?;
        resources.define_output(GBUFFER_DIFFUSE, false, None, self.diffuse.clone())?;
        resources.define_output(GBUFFER_DEPTH_DOWNSAMPLE, true, None, self.downsample_info())
    }

    fn draw(&mut self, cx: &mut DrawContext<'_>) -> Result<(), RenderError> {
        let depth = cx.get_target(&self.depth)?;
        let normals = cx.get_target(&self.normals)?;
        let diffuse = cx.get_target(&self.diffuse)?;

        cx.device.set_render_targets(&[depth, normals, diffuse])?;
        // Depth clears to the far plane, everything else to zero.
        cx.device.clear(ClearOptions::all(LinearRgba::TRANSPARENT))?;

        let scene = cx.scene;
        for provider in scene.find_managers::<dyn GeometryProvider>() {
            provider.draw(GBUFFER_PHASE, cx.device, cx.metadata)?;
        }

        cx.output(GBUFFER_DEPTH, depth)?;
        cx.output(GBUFFER_NORMALS, normals)?;
        cx.output(GBUFFER_DIFFUSE, diffuse)?;

        let resolution = cx.resolution();
        let half = self
            .downsample_info()
            .resolve((resolution.width / 2).max(1), (resolution.height / 2).max(1));
        let downsample = cx.get_target(&half)?;
        cx.device.set_render_targets(&[])?;
        cx.device.resample(depth, downsample)?;
        cx.device.set_render_targets(&[downsample])?;
        cx.output(GBUFFER_DEPTH_DOWNSAMPLE, downsample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::Harness;
    use myre_core::math::Extent2D;
    use myre_core::renderer::GraphicsDevice;
    use myre_core::{RendererMetadata, Scene};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingProvider {
        phases: Mutex<Vec<String>>,
    }

    impl GeometryProvider for RecordingProvider {
        fn draw(
            &self,
            phase: &str,
            device: &dyn GraphicsDevice,
            _metadata: &RendererMetadata,
        ) -> Result<(), RenderError> {
            assert_eq!(device.render_targets().len(), 3);
            self.phases.lock().unwrap().push(phase.to_owned());
            Ok(())
        }
    }

    #[test]
    fn draws_geometry_and_downsamples_depth() {
        let provider = Arc::new(RecordingProvider::default());
        let mut scene = Scene::new();
        scene.register::<dyn GeometryProvider>(provider.clone());

        let mut harness = Harness::new(scene);
        let mut plan = harness
            .factory
            .start_plan()
            .then(GeometryBufferComponent::new())
            .final_output(GBUFFER_DEPTH_DOWNSAMPLE)
            .log_dead_outputs(false)
            .build()
            .unwrap();

        let output = harness.execute(&mut plan).unwrap();
        assert_eq!(*provider.phases.lock().unwrap(), vec!["gbuffer".to_owned()]);
        assert_eq!(harness.device.stats().resamples, 1);
        assert_eq!(
            harness.device.render_target_size(output.image).unwrap(),
            Extent2D::new(320, 240)
        );

        // Nothing reads the full resolution targets: they are back in the pool.
        let stats = harness.targets.stats();
        assert_eq!(stats.allocated, 4);
        assert_eq!(stats.in_use, 1);

        output.finalise(&mut harness.targets).unwrap();
        assert_eq!(harness.targets.stats().in_use, 0);
    }
}
