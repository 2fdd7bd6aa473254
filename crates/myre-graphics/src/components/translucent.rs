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

use super::{with_pipeline_state, GBUFFER_DEPTH};
use crate::component::{DrawContext, InitialiseContext, RendererComponent};
use crate::error::PlanError;
use crate::resource::ResourceContext;
use myre_core::metadata::names;
use myre_core::renderer::{BlendState, DepthStencilState, PipelineState, RenderError, TextureId};
use myre_core::scene::GeometryProvider;

/// Phase name passed to every [`GeometryProvider`].
pub const TRANSLUCENT_PHASE: &str = "translucent";

/// Draws translucent geometry on top of whatever the previous component left
/// bound, and passes those targets on.
///
/// Reads [`GBUFFER_DEPTH`] when the plan has one, so providers can depth test
/// against opaque geometry.
#[derive(Debug, Clone, Default)]
pub struct TranslucentComponent {
    passthrough: Vec<String>,
    reads_depth: bool,
}

impl TranslucentComponent {
    /// Creates the component.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RendererComponent for TranslucentComponent {
    fn name(&self) -> &str {
        "translucent"
    }

    fn initialise(
        &mut self,
        _cx: &InitialiseContext<'_>,
        resources: &mut ResourceContext,
    ) -> Result<(), PlanError> {
        self.reads_depth = resources.is_available(GBUFFER_DEPTH);
        if self.reads_depth {
            resources.define_input(GBUFFER_DEPTH)?;
        }

        let set_targets = resources.set_render_targets().to_vec();
        self.passthrough = set_targets.iter().map(|r| r.name.clone()).collect();
        for target in &set_targets {
            resources.republish(target, true)?;
        }
        Ok(())
    }

    fn draw(&mut self, cx: &mut DrawContext<'_>) -> Result<(), RenderError> {
        let targets = self
            .passthrough
            .iter()
            .map(|name| cx.resource(name))
            .collect::<Result<Vec<TextureId>, _>>()?;
        cx.device.set_render_targets(&targets)?;

        let depth = if self.reads_depth {
            cx.try_resource(GBUFFER_DEPTH)
        } else {
            None
        };
        cx.metadata.write(names::GBUFFER_DEPTH, depth);

        let state = PipelineState::default()
            .with_blend(BlendState::AlphaBlend)
            .with_depth_stencil(DepthStencilState::DepthRead);
        let device = cx.device;
        let metadata = &*cx.metadata;
        let scene = cx.scene;
        let providers = scene.find_managers::<dyn GeometryProvider>();
        with_pipeline_state(device, state, || {
            providers
                .iter()
                .try_for_each(|provider| provider.draw(TRANSLUCENT_PHASE, device, metadata))
        })?;

        for (name, target) in self.passthrough.iter().zip(targets) {
            cx.output(name, target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::Harness;
    use crate::components::{
        GeometryBufferComponent, LightingComponent, GBUFFER_DEPTH_DOWNSAMPLE, GBUFFER_DIFFUSE,
        GBUFFER_NORMALS, LIGHTBUFFER,
    };
    use myre_core::renderer::GraphicsDevice;
    use myre_core::{RendererMetadata, Scene};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingProvider {
        phases: Mutex<Vec<(String, BlendState)>>,
    }

    impl GeometryProvider for RecordingProvider {
        fn draw(
            &self,
            phase: &str,
            device: &dyn GraphicsDevice,
            _metadata: &RendererMetadata,
        ) -> Result<(), RenderError> {
            let blend = device.pipeline_state().blend;
            self.phases.lock().unwrap().push((phase.to_owned(), blend));
            Ok(())
        }
    }

    #[test]
    fn extends_depth_lifetime_and_passes_targets_through() {
        let provider = Arc::new(RecordingProvider::default());
        let mut scene = Scene::new();
        scene.register::<dyn GeometryProvider>(provider.clone());

        let mut harness = Harness::new(scene);
        let mut plan = harness
            .factory
            .start_plan()
            .then(GeometryBufferComponent::new())
            .then(LightingComponent::new())
            .then(TranslucentComponent::new())
            .build()
            .unwrap();

        assert_eq!(plan.inputs_of(2), [GBUFFER_DEPTH.to_owned()]);
        assert_eq!(plan.outputs_of(2)[0].name, LIGHTBUFFER);
        assert_eq!(plan.finalised_after(0), [GBUFFER_DEPTH_DOWNSAMPLE.to_owned()]);
        assert_eq!(
            plan.finalised_after(1),
            [GBUFFER_NORMALS.to_owned(), GBUFFER_DIFFUSE.to_owned()]
        );
        assert_eq!(plan.finalised_after(2), [GBUFFER_DEPTH.to_owned()]);
        assert_eq!(plan.final_output(), LIGHTBUFFER);

        let output = harness.execute(&mut plan).unwrap();
        assert_eq!(harness.device.render_targets(), vec![output.image]);
        assert_eq!(
            *provider.phases.lock().unwrap(),
            vec![
                ("gbuffer".to_owned(), BlendState::Opaque),
                ("translucent".to_owned(), BlendState::AlphaBlend),
            ]
        );
        assert_eq!(harness.device.pipeline_state(), PipelineState::default());
        assert_eq!(harness.targets.stats().in_use, 1);
        output.finalise(&mut harness.targets).unwrap();
    }
}
