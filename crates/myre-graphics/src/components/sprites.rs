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

use super::with_pipeline_state;
use crate::component::{DrawContext, InitialiseContext, RendererComponent};
use crate::error::PlanError;
use crate::resource::ResourceContext;
use myre_core::renderer::{BlendState, DepthStencilState, PipelineState, RenderError, TextureId};
use myre_core::scene::SpriteProvider;

/// Draws every [`SpriteProvider`] of the scene onto the targets the previous
/// component left bound.
#[derive(Debug, Clone, Default)]
pub struct SpriteComponent {
    passthrough: Vec<String>,
}

impl SpriteComponent {
    /// Creates the component.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RendererComponent for SpriteComponent {
    fn name(&self) -> &str {
        "sprites"
    }

    fn initialise(
        &mut self,
        _cx: &InitialiseContext<'_>,
        resources: &mut ResourceContext,
    ) -> Result<(), PlanError> {
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

        let state = PipelineState::default()
            .with_blend(BlendState::AlphaBlend)
            .with_depth_stencil(DepthStencilState::None);
        let device = cx.device;
        let metadata = &*cx.metadata;
        let scene = cx.scene;
        with_pipeline_state(device, state, || {
            scene
                .find_managers::<dyn SpriteProvider>()
                .iter()
                .try_for_each(|provider| provider.draw_sprites(device, metadata))
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
    use crate::components::CreateTargetComponent;
    use crate::render_target::RenderTargetInfo;
    use myre_core::renderer::{GraphicsDevice, TextureFormat};
    use myre_core::{RendererMetadata, Scene};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingSprites(AtomicUsize);

    impl SpriteProvider for CountingSprites {
        fn draw_sprites(
            &self,
            device: &dyn GraphicsDevice,
            _metadata: &RendererMetadata,
        ) -> Result<(), RenderError> {
            assert_eq!(device.pipeline_state().blend, BlendState::AlphaBlend);
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    #[test]
    fn sprites_draw_onto_the_set_target() {
        let sprites = Arc::new(CountingSprites::default());
        let mut scene = Scene::new();
        scene.register::<dyn SpriteProvider>(sprites.clone());

        let mut harness = Harness::new(scene);
        let mut plan = harness
            .factory
            .start_plan()
            .then(CreateTargetComponent::new(
                RenderTargetInfo::auto(TextureFormat::Rgba8Unorm),
                "ui",
            ))
            .then(SpriteComponent::new())
            .build()
            .unwrap();

        assert_eq!(plan.outputs_of(1)[0].name, "ui");
        for _ in 0..2 {
            let output = harness.execute(&mut plan).unwrap();
            assert_eq!(harness.device.render_targets(), vec![output.image]);
            output.finalise(&mut harness.targets).unwrap();
        }
        assert_eq!(sprites.0.load(Ordering::Relaxed), 2);
        assert_eq!(harness.targets.stats().allocated, 1);
    }

    #[test]
    fn nothing_set_means_nothing_published() {
        let harness = Harness::new(Scene::new());
        let err = harness
            .factory
            .start_plan()
            .then(SpriteComponent::new())
            .build()
            .unwrap_err();
        assert_eq!(err, PlanError::NoOutputs);
    }
}
