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

use super::table::StepDeclaration;
use super::{PlanStep, RenderPlan};
use crate::component::{InitialiseContext, RendererComponent};
use crate::error::PlanError;
use crate::renderer::RendererId;
use crate::resource::{ResourceContext, ResourceInfo};
use myre_core::renderer::GraphicsDevice;
use myre_core::Scene;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Everything needed to build plans for one renderer.
#[derive(Clone)]
pub struct PlanFactory {
    device: Arc<dyn GraphicsDevice>,
    scene: Arc<Scene>,
    renderer: RendererId,
}

impl PlanFactory {
    /// Creates a factory that is not tied to an existing renderer.
    pub fn new(device: Arc<dyn GraphicsDevice>, scene: Arc<Scene>) -> Self {
        Self::for_renderer(device, scene, RendererId::next())
    }

    pub(crate) fn for_renderer(
        device: Arc<dyn GraphicsDevice>,
        scene: Arc<Scene>,
        renderer: RendererId,
    ) -> Self {
        Self {
            device,
            scene,
            renderer,
        }
    }

    /// The renderer plans built by this factory belong to.
    pub fn renderer(&self) -> RendererId {
        self.renderer
    }

    /// The device components are initialised against.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// The scene components look their collaborators up in.
    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Starts a new plan.
    pub fn start_plan(&self) -> PlanBuilder {
        PlanBuilder {
            factory: self.clone(),
            components: Vec::new(),
            final_output: None,
            log_dead_outputs: true,
        }
    }
}

impl fmt::Debug for PlanFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanFactory")
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`RenderPlan`].
///
/// Components run in the order they are added. The builder does not reorder
/// them: [`build`](Self::build) only checks that every resource a component
/// reads was produced by an earlier one.
pub struct PlanBuilder {
    factory: PlanFactory,
    components: Vec<Box<dyn RendererComponent>>,
    final_output: Option<String>,
    log_dead_outputs: bool,
}

impl PlanBuilder {
    /// Appends a component.
    pub fn then(self, component: impl RendererComponent + 'static) -> Self {
        self.then_boxed(Box::new(component))
    }

    /// Appends an already boxed component.
    pub fn then_boxed(mut self, component: Box<dyn RendererComponent>) -> Self {
        self.components.push(component);
        self
    }

    /// Picks the resource returned by [`RenderPlan::execute`]. Defaults to the
    /// first output of the last component that declares any.
    pub fn final_output(mut self, name: impl Into<String>) -> Self {
        self.final_output = Some(name.into());
        self
    }

    /// Whether to warn about resources that are produced but never used.
    pub fn log_dead_outputs(mut self, enabled: bool) -> Self {
        self.log_dead_outputs = enabled;
        self
    }

    /// Initialises every component in order and freezes the plan.
    ///
    /// # Errors
    /// Any [`PlanError`] raised while a component declares its resources, and
    /// [`PlanError::EmptyPlan`], [`PlanError::UnknownFinalOutput`] or
    /// [`PlanError::NoOutputs`] for the plan as a whole. Components that were
    /// already initialised are disposed before the error is returned.
    pub fn build(self) -> Result<RenderPlan, PlanError> {
        let PlanBuilder {
            factory,
            components,
            final_output,
            log_dead_outputs,
        } = self;
        if components.is_empty() {
            return Err(PlanError::EmptyPlan);
        }

        let device = factory.device.as_ref();
        let cx = InitialiseContext {
            device,
            scene: &factory.scene,
        };

        let mut steps: Vec<PlanStep> = Vec::with_capacity(components.len());
        let mut available: Vec<ResourceInfo> = Vec::new();
        let mut set_targets: Vec<ResourceInfo> = Vec::new();

        for mut component in components {
            let name = component.name().to_owned();
            let mut resources =
                ResourceContext::new(name.clone(), available.clone(), set_targets.clone());
            if let Err(err) = component.initialise(&cx, &mut resources) {
                log::error!("Render plan configuration error: {err}");
                dispose_all(&mut steps, device);
                return Err(err);
            }

            let (inputs, outputs) = resources.into_declarations();
            for output in &outputs {
                match available.iter_mut().find(|r| r.name == output.name) {
                    Some(existing) => *existing = output.clone(),
                    None => available.push(output.clone()),
                }
            }
            set_targets = outputs.iter().filter(|o| o.is_left_set).cloned().collect();

            steps.push(PlanStep {
                component,
                declaration: StepDeclaration {
                    name,
                    inputs,
                    outputs,
                    finalise_after: Vec::new(),
                },
            });
        }

        let final_output = match final_output {
            Some(name) if available.iter().any(|r| r.name == name) => name,
            Some(name) => {
                dispose_all(&mut steps, device);
                return Err(PlanError::UnknownFinalOutput(name));
            }
            None => match steps
                .iter()
                .rev()
                .find_map(|step| step.declaration.outputs.first())
            {
                Some(output) => output.name.clone(),
                None => {
                    dispose_all(&mut steps, device);
                    return Err(PlanError::NoOutputs);
                }
            },
        };

        schedule_finalisation(&mut steps, &final_output, log_dead_outputs);

        log::info!(
            "Built render plan [{}] with final output '{}'",
            steps
                .iter()
                .map(|s| s.declaration.name.as_str())
                .collect::<Vec<_>>()
                .join(" -> "),
            final_output
        );

        Ok(RenderPlan::new(steps, final_output, factory.renderer))
    }
}

impl fmt::Debug for PlanBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanBuilder")
            .field(
                "components",
                &self.components.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("final_output", &self.final_output)
            .finish()
    }
}

/// Each resource dies after the last step that reads or republishes it. The
/// final output never dies inside the plan.
fn schedule_finalisation(steps: &mut [PlanStep], final_output: &str, log_dead_outputs: bool) {
    let mut scheduled = HashSet::new();
    let mut schedule: Vec<(usize, String)> = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        for output in &step.declaration.outputs {
            if !scheduled.insert(output.name.as_str()) {
                continue;
            }
            let last_use = steps
                .iter()
                .enumerate()
                .skip(index + 1)
                .filter(|(_, later)| later.declaration.declares(&output.name))
                .map(|(later, _)| later)
                .last()
                .unwrap_or(index);

            if output.name == final_output {
                continue;
            }
            if last_use == index && log_dead_outputs {
                log::warn!(
                    "Resource '{}' of component '{}' is never used",
                    output.name,
                    step.declaration.name
                );
            }
            schedule.push((last_use, output.name.clone()));
        }
    }

    for (index, name) in schedule {
        steps[index].declaration.finalise_after.push(name);
    }
}

fn dispose_all(steps: &mut [PlanStep], device: &dyn GraphicsDevice) {
    for step in steps {
        step.component.dispose(device);
    }
}
