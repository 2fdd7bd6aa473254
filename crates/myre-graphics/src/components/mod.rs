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

//! Stock renderer components of the deferred pipeline.
//!
//! A typical plan:
//!
//! ```text
//! GeometryBufferComponent → LightingComponent → TranslucentComponent → SpriteComponent
//! ```
//!
//! Components exchange targets through the resource names defined here.

mod create_target;
mod gbuffer;
mod lighting;
mod resample;
mod sprites;
mod translucent;

pub use self::create_target::CreateTargetComponent;
pub use self::gbuffer::GeometryBufferComponent;
pub use self::lighting::LightingComponent;
pub use self::resample::ResampleComponent;
pub use self::sprites::SpriteComponent;
pub use self::translucent::TranslucentComponent;

use myre_core::renderer::{GraphicsDevice, PipelineState, RenderError};

/// Scene depth, written by the geometry pass.
pub const GBUFFER_DEPTH: &str = "gbuffer_depth";
/// View space normals, written by the geometry pass.
pub const GBUFFER_NORMALS: &str = "gbuffer_normals";
/// Albedo, written by the geometry pass.
pub const GBUFFER_DIFFUSE: &str = "gbuffer_diffuse";
/// Half resolution scene depth.
pub const GBUFFER_DEPTH_DOWNSAMPLE: &str = "gbuffer_depth_downsample";
/// Accumulated lighting (HDR).
pub const LIGHTBUFFER: &str = "lightbuffer";

/// Runs `draw` with `state` set, then puts the default state back, whether
/// `draw` failed or not.
pub(crate) fn with_pipeline_state<F>(
    device: &dyn GraphicsDevice,
    state: PipelineState,
    draw: F,
) -> Result<(), RenderError>
where
    F: FnOnce() -> Result<(), RenderError>,
{
    device.set_pipeline_state(state);
    let result = draw();
    device.set_pipeline_state(PipelineState::default());
    result
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::plan::{FrameContext, PlanFactory, PlanOutput, RenderPlan};
    use crate::render_target::RenderTargetManager;
    use myre_core::math::Extent2D;
    use myre_core::renderer::{GraphicsDevice, HeadlessDevice, RenderError};
    use myre_core::{RendererMetadata, Scene};
    use std::sync::Arc;

    pub(crate) struct Harness {
        pub(crate) device: Arc<HeadlessDevice>,
        pub(crate) factory: PlanFactory,
        pub(crate) targets: RenderTargetManager,
        pub(crate) metadata: RendererMetadata,
    }

    impl Harness {
        pub(crate) fn new(scene: Scene) -> Self {
            let device = Arc::new(HeadlessDevice::new(Extent2D::new(640, 480)));
            let dyn_device: Arc<dyn GraphicsDevice> = device.clone();
            Self {
                factory: PlanFactory::new(dyn_device, Arc::new(scene)),
                device,
                targets: RenderTargetManager::new(),
                metadata: RendererMetadata::new(),
            }
        }

        pub(crate) fn execute(&mut self, plan: &mut RenderPlan) -> Result<PlanOutput, RenderError> {
            let scene = self.factory.scene().clone();
            let mut frame = FrameContext {
                device: &*self.device,
                targets: &mut self.targets,
                metadata: &mut self.metadata,
                scene: &scene,
            };
            plan.execute(&mut frame)
        }
    }
}
