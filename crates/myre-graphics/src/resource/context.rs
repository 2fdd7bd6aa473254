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

use super::{Finaliser, ResourceInfo};
use crate::error::PlanError;
use crate::render_target::RenderTargetInfo;

/// The negotiation object a component receives when it is wired into a plan.
///
/// It exposes what earlier components produce and what the previous component
/// leaves bound, and records what this component reads and writes. It is built
/// fresh for every component and consumed by the plan once the component is
/// initialised.
#[derive(Debug)]
pub struct ResourceContext {
    component: String,
    available: Vec<ResourceInfo>,
    set_targets: Vec<ResourceInfo>,
    inputs: Vec<String>,
    outputs: Vec<ResourceInfo>,
}

impl ResourceContext {
    /// Creates a context for `component`.
    /// ## Arguments
    /// * `component` - Name of the component being initialised, used in errors.
    /// * `available` - Resources produced by earlier components.
    /// * `set_targets` - Resources left bound by the previous component.
    pub fn new(
        component: impl Into<String>,
        available: Vec<ResourceInfo>,
        set_targets: Vec<ResourceInfo>,
    ) -> Self {
        Self {
            component: component.into(),
            available,
            set_targets,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Resources produced by earlier components.
    pub fn available_resources(&self) -> &[ResourceInfo] {
        &self.available
    }

    /// Resources bound to the device when this component starts drawing.
    pub fn set_render_targets(&self) -> &[ResourceInfo] {
        &self.set_targets
    }

    /// Looks up an available resource.
    pub fn available(&self, name: &str) -> Option<&ResourceInfo> {
        self.available.iter().find(|r| r.name == name)
    }

    /// Returns `true` if an earlier component produces `name`.
    pub fn is_available(&self, name: &str) -> bool {
        self.available(name).is_some()
    }

    /// Declares that this component reads `name`.
    ///
    /// # Errors
    /// [`PlanError::UnavailableInput`] if no earlier component produces it.
    pub fn define_input(&mut self, name: &str) -> Result<(), PlanError> {
        if !self.is_available(name) {
            return Err(PlanError::UnavailableInput {
                component: self.component.clone(),
                resource: name.to_owned(),
            });
        }
        if !self.inputs.iter().any(|input| input == name) {
            self.inputs.push(name.to_owned());
        }
        Ok(())
    }

    /// Declares a new resource this component produces.
    /// ## Arguments
    /// * `name` - The resource name, unique in the plan.
    /// * `is_left_set` - Whether the target stays bound after this component draws.
    /// * `finaliser` - Cleanup action, [`Finaliser::ReturnToPool`] when `None`.
    /// * `format` - Shape of the target.
    /// ## Errors
    /// * [`PlanError::DuplicateOutput`] - If the name is already produced in the plan.
    pub fn define_output(
        &mut self,
        name: &str,
        is_left_set: bool,
        finaliser: Option<Finaliser>,
        format: RenderTargetInfo,
    ) -> Result<(), PlanError> {
        if self.is_available(name) || self.declares_output(name) {
            return Err(PlanError::DuplicateOutput {
                component: self.component.clone(),
                resource: name.to_owned(),
            });
        }
        self.outputs.push(ResourceInfo {
            name: name.to_owned(),
            format,
            is_left_set,
            finaliser: finaliser.unwrap_or_default(),
        });
        Ok(())
    }

    /// Re-emits an existing resource, typically a target this component draws
    /// into in place. The resource then lives at least until this component
    /// has drawn.
    ///
    /// # Errors
    /// [`PlanError::UnavailableInput`] if the resource is not available, and
    /// [`PlanError::DuplicateOutput`] if this component already outputs it.
    pub fn republish(&mut self, resource: &ResourceInfo, is_left_set: bool) -> Result<(), PlanError> {
        if !self.is_available(&resource.name) {
            return Err(PlanError::UnavailableInput {
                component: self.component.clone(),
                resource: resource.name.clone(),
            });
        }
        if self.declares_output(&resource.name) {
            return Err(PlanError::DuplicateOutput {
                component: self.component.clone(),
                resource: resource.name.clone(),
            });
        }
        self.outputs.push(ResourceInfo {
            is_left_set,
            ..resource.clone()
        });
        Ok(())
    }

    /// Inputs declared so far.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Outputs declared so far.
    pub fn outputs(&self) -> &[ResourceInfo] {
        &self.outputs
    }

    fn declares_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|output| output.name == name)
    }

    pub(crate) fn into_declarations(self) -> (Vec<String>, Vec<ResourceInfo>) {
        (self.inputs, self.outputs)
    }
}
