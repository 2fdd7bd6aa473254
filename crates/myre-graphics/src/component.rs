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

//! # Renderer Components
//!
//! A **renderer component** is one stage of a [`RenderPlan`](crate::RenderPlan):
//! a gbuffer pass, a lighting pass, a post-process filter, ...
//!
//! ## Lifecycle
//!
//! ```text
//! initialise(cx, resources)  →  [ draw(cx) ]*  →  dispose(device)
//! ```
//!
//! - **`initialise`** runs once, when the plan is built. The component declares
//!   the named resources it reads and writes through the [`ResourceContext`].
//!   Reading a resource no earlier component produces fails here, never at
//!   draw time.
//! - **`draw`** runs once per plan execution, that is once per view per frame.
//!   The component fetches its inputs with [`DrawContext::resource`], draws,
//!   and publishes each declared output with [`DrawContext::output`].
//! - **`dispose`** releases resources the component owns outside the pool.
//!
//! Device state (bound targets, [`PipelineState`](myre_core::renderer::PipelineState))
//! carries over from one component to the next. A component that changes the
//! pipeline state puts the default back before returning.

use crate::error::{PlanError, TargetError};
use crate::plan::{ResourceTable, StepDeclaration};
use crate::render_target::{RenderTargetInfo, RenderTargetManager};
use crate::resource::{ResourceContext, ResourceInfo};
use myre_core::math::Extent2D;
use myre_core::metadata::names;
use myre_core::renderer::{GraphicsDevice, RenderError, TextureId};
use myre_core::{RendererMetadata, Scene};

/// What a component may look at while it is wired into a plan.
#[derive(Clone, Copy)]
pub struct InitialiseContext<'a> {
    /// The device the plan renders with.
    pub device: &'a dyn GraphicsDevice,
    /// The scene, to look up collaborators by capability.
    pub scene: &'a Scene,
}

/// The unit of rendering work of a [`RenderPlan`](crate::RenderPlan).
pub trait RendererComponent: Send {
    /// Name used in logs and configuration errors.
    fn name(&self) -> &str;

    /// Declares the resources this component reads and writes.
    fn initialise(
        &mut self,
        cx: &InitialiseContext<'_>,
        resources: &mut ResourceContext,
    ) -> Result<(), PlanError>;

    /// Draws one execution of the plan.
    fn draw(&mut self, cx: &mut DrawContext<'_>) -> Result<(), RenderError>;

    /// Releases resources owned by the component itself. Pooled targets are
    /// never released here.
    fn dispose(&mut self, _device: &dyn GraphicsDevice) {}
}

/// Everything a component can reach while drawing.
pub struct DrawContext<'a> {
    /// The device to draw with.
    pub device: &'a dyn GraphicsDevice,
    /// The shared target pool.
    pub targets: &'a mut RenderTargetManager,
    /// Per-view metadata.
    pub metadata: &'a mut RendererMetadata,
    /// The scene, to look up collaborators by capability.
    pub scene: &'a Scene,
    step: &'a StepDeclaration,
    table: &'a mut ResourceTable,
}

impl<'a> DrawContext<'a> {
    pub(crate) fn new(
        device: &'a dyn GraphicsDevice,
        targets: &'a mut RenderTargetManager,
        metadata: &'a mut RendererMetadata,
        scene: &'a Scene,
        step: &'a StepDeclaration,
        table: &'a mut ResourceTable,
    ) -> Self {
        Self {
            device,
            targets,
            metadata,
            scene,
            step,
            table,
        }
    }

    /// Name of the component currently drawing.
    pub fn component(&self) -> &str {
        &self.step.name
    }

    /// Returns the target currently satisfying a declared resource.
    ///
    /// # Errors
    /// [`PlanError::UnavailableInput`] if the component did not declare the
    /// resource, and [`PlanError::MissingResource`] if it was never output.
    pub fn resource(&self, name: &str) -> Result<TextureId, PlanError> {
        if !self.step.declares(name) {
            return Err(PlanError::UnavailableInput {
                component: self.step.name.clone(),
                resource: name.to_owned(),
            });
        }
        self.table
            .get(name)
            .map(|live| live.target)
            .ok_or_else(|| PlanError::MissingResource {
                component: self.step.name.clone(),
                resource: name.to_owned(),
            })
    }

    /// Like [`resource`](Self::resource), for inputs declared optionally.
    pub fn try_resource(&self, name: &str) -> Option<TextureId> {
        if !self.step.declares(name) {
            return None;
        }
        self.table.get(name).map(|live| live.target)
    }

    /// Publishes `target` as the current value of a declared output.
    ///
    /// If the output already held another target (a republished resource drawn
    /// into a new target), the previous target is finalised.
    pub fn output(&mut self, name: &str, target: TextureId) -> Result<(), RenderError> {
        let declaration = self
            .step
            .output(name)
            .ok_or_else(|| PlanError::UndeclaredOutput {
                component: self.step.name.clone(),
                resource: name.to_owned(),
            })?;

        let previous = self.table.publish(name, target, declaration.finaliser.clone());
        if let Some(previous) = previous.filter(|previous| previous.target != target) {
            previous.finaliser.run(self.targets, previous.target)?;
        }
        Ok(())
    }

    /// The declaration of one of this component's outputs.
    pub fn declared_output(&self, name: &str) -> Option<&ResourceInfo> {
        self.step.output(name)
    }

    /// Takes a target from the pool, resolving automatic dimensions against
    /// the view [`resolution`](Self::resolution).
    pub fn get_target(&mut self, info: &RenderTargetInfo) -> Result<TextureId, TargetError> {
        let resolved = info.resolve_to(self.resolution());
        self.targets.get_target(self.device, &resolved)
    }

    /// The resolution of the view being drawn: the `resolution` metadata entry
    /// when set, the back buffer size otherwise.
    pub fn resolution(&self) -> Extent2D {
        match self.metadata.read(names::RESOLUTION) {
            Ok(resolution) if !Extent2D::from_vec2(resolution).is_empty() => {
                Extent2D::from_vec2(resolution)
            }
            _ => self.device.back_buffer_size(),
        }
    }
}
