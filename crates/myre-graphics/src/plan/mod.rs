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

//! # Render Plans
//!
//! A [`RenderPlan`] is an ordered list of [`RendererComponent`]s plus the
//! bookkeeping that routes named resources between them.
//!
//! ## Execution
//!
//! ```text
//! reset table → for each component: draw → check left-set outputs are bound
//!                                         → finalise resources nobody reads any more
//!             → hand the final output to the caller
//! ```
//!
//! The set of resources that die after each component is computed once, when
//! the plan is built. A resource dies right after the last component that reads
//! or republishes it, so its target is back in the pool before the next
//! component asks for one. The final output is never finalised by the plan: it
//! is returned as a [`PlanOutput`] and the caller finalises it once the image
//! has been composited.
//!
//! If anything fails mid-execution the plan is abandoned: every live resource
//! is finalised on a best-effort basis and the error is returned.

mod builder;
mod table;

pub use self::builder::{PlanBuilder, PlanFactory};
pub(crate) use self::table::{ResourceTable, StepDeclaration};

use crate::component::{DrawContext, RendererComponent};
use crate::error::{PlanError, TargetError};
use crate::render_target::RenderTargetManager;
use crate::renderer::{Renderer, RendererId};
use crate::resource::ResourceInfo;
use myre_core::renderer::{GraphicsDevice, RenderError, TextureId};
use myre_core::{RendererMetadata, Scene};
use std::fmt;

/// The per-frame state a plan executes against.
pub struct FrameContext<'a> {
    /// The device to draw with.
    pub device: &'a dyn GraphicsDevice,
    /// The shared target pool.
    pub targets: &'a mut RenderTargetManager,
    /// Metadata of the view being drawn.
    pub metadata: &'a mut RendererMetadata,
    /// The scene being drawn.
    pub scene: &'a Scene,
}

/// The terminal image of one plan execution.
///
/// The target stays checked out until [`finalise`](Self::finalise) is called.
#[must_use = "the image stays out of the pool until `finalise` is called"]
#[derive(Debug)]
pub struct PlanOutput {
    /// The target holding the image.
    pub image: TextureId,
    /// The declaration of the final resource.
    pub resource: ResourceInfo,
}

impl PlanOutput {
    /// Runs the resource's finaliser, usually returning the target to the pool.
    pub fn finalise(self, targets: &mut RenderTargetManager) -> Result<(), TargetError> {
        self.resource.finaliser.run(targets, self.image)
    }
}

pub(crate) struct PlanStep {
    pub(crate) component: Box<dyn RendererComponent>,
    pub(crate) declaration: StepDeclaration,
}

/// An initialised, frozen sequence of renderer components.
pub struct RenderPlan {
    steps: Vec<PlanStep>,
    final_output: String,
    table: ResourceTable,
    renderer: RendererId,
    disposed: bool,
}

impl RenderPlan {
    fn new(steps: Vec<PlanStep>, final_output: String, renderer: RendererId) -> Self {
        Self {
            steps,
            final_output,
            table: ResourceTable::default(),
            renderer,
            disposed: false,
        }
    }

    /// Runs every component once and returns the final image.
    ///
    /// # Errors
    /// Whatever a component's draw returns, plus [`PlanError`]s for contract
    /// violations detected while running: reading a resource that was never
    /// output, or leaving a different target bound than declared. The plan is
    /// abandoned before the error is returned.
    pub fn execute(&mut self, frame: &mut FrameContext<'_>) -> Result<PlanOutput, RenderError> {
        if self.disposed {
            return Err(PlanError::NotInitialised {
                component: self
                    .steps
                    .first()
                    .map(|step| step.declaration.name.clone())
                    .unwrap_or_default(),
            }
            .into());
        }

        // Leftovers of an interrupted execution.
        if !self.table.is_empty() {
            self.abandon(frame.targets);
        }

        for index in 0..self.steps.len() {
            if let Err(err) = self.run_step(index, frame) {
                log::warn!(
                    "Component '{}' failed, abandoning plan: {err}",
                    self.steps[index].declaration.name
                );
                self.abandon(frame.targets);
                return Err(err);
            }
        }

        let Some(live) = self.table.take(&self.final_output) else {
            let producer = self
                .steps
                .iter()
                .rev()
                .find(|step| step.declaration.output(&self.final_output).is_some())
                .map(|step| step.declaration.name.clone())
                .unwrap_or_default();
            self.abandon(frame.targets);
            return Err(PlanError::MissingResource {
                component: producer,
                resource: self.final_output.clone(),
            }
            .into());
        };

        debug_assert!(self.table.is_empty(), "resources outlived the plan");
        let resource = self
            .final_declaration()
            .cloned()
            .map(|declaration| ResourceInfo {
                finaliser: live.finaliser.clone(),
                ..declaration
            })
            .ok_or_else(|| RenderError::Internal("final output has no declaration".into()))?;

        Ok(PlanOutput {
            image: live.target,
            resource,
        })
    }

    fn run_step(&mut self, index: usize, frame: &mut FrameContext<'_>) -> Result<(), RenderError> {
        let RenderPlan { steps, table, .. } = self;
        let PlanStep {
            component,
            declaration,
        } = &mut steps[index];

        {
            let mut cx = DrawContext::new(
                frame.device,
                frame.targets,
                frame.metadata,
                frame.scene,
                declaration,
                table,
            );
            component.draw(&mut cx)?;
        }

        let bound = frame.device.render_targets();
        for output in declaration.outputs.iter().filter(|o| o.is_left_set) {
            if let Some(live) = table.get(&output.name) {
                if !bound.contains(&live.target) {
                    return Err(PlanError::BoundTargetMismatch {
                        component: declaration.name.clone(),
                        resource: output.name.clone(),
                    }
                    .into());
                }
            }
        }

        for name in &declaration.finalise_after {
            if let Some(live) = table.take(name) {
                live.finaliser.run(frame.targets, live.target)?;
            }
        }
        Ok(())
    }

    fn abandon(&mut self, targets: &mut RenderTargetManager) {
        for (name, live) in self.table.drain() {
            if let Err(err) = live.finaliser.run(targets, live.target) {
                log::warn!("Failed to finalise '{name}' while abandoning plan: {err}");
            }
        }
    }

    fn final_declaration(&self) -> Option<&ResourceInfo> {
        self.steps
            .iter()
            .rev()
            .find_map(|step| step.declaration.output(&self.final_output))
    }

    /// Makes this plan the default plan of `renderer`, returning the previous one.
    pub fn apply(self, renderer: &mut Renderer) -> Option<RenderPlan> {
        renderer.set_plan(self)
    }

    /// Disposes every component. The plan cannot execute afterwards.
    pub fn dispose(&mut self, device: &dyn GraphicsDevice) {
        if self.disposed {
            return;
        }
        for step in &mut self.steps {
            step.component.dispose(device);
        }
        self.disposed = true;
    }

    /// Returns `true` once [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The renderer this plan was built for.
    pub fn renderer(&self) -> RendererId {
        self.renderer
    }

    /// The name of the resource [`execute`](Self::execute) returns.
    pub fn final_output(&self) -> &str {
        &self.final_output
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the plan has no component. Built plans always have one.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Component names, in execution order.
    pub fn component_names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .map(|step| step.declaration.name.as_str())
            .collect()
    }

    /// Resources read by the component at `index`.
    pub fn inputs_of(&self, index: usize) -> &[String] {
        self.steps
            .get(index)
            .map(|step| step.declaration.inputs.as_slice())
            .unwrap_or(&[])
    }

    /// Resources written by the component at `index`.
    pub fn outputs_of(&self, index: usize) -> &[ResourceInfo] {
        self.steps
            .get(index)
            .map(|step| step.declaration.outputs.as_slice())
            .unwrap_or(&[])
    }

    /// Resources finalised right after the component at `index` has drawn.
    pub fn finalised_after(&self, index: usize) -> &[String] {
        self.steps
            .get(index)
            .map(|step| step.declaration.finalise_after.as_slice())
            .unwrap_or(&[])
    }
}

impl fmt::Debug for RenderPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPlan")
            .field("components", &self.component_names())
            .field("final_output", &self.final_output)
            .field("renderer", &self.renderer)
            .field("disposed", &self.disposed)
            .finish()
    }
}
