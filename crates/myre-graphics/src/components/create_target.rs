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
use myre_core::math::LinearRgba;
use myre_core::renderer::{ClearOptions, RenderError};
use std::sync::atomic::{AtomicUsize, Ordering};

static ANONYMOUS_TARGETS: AtomicUsize = AtomicUsize::new(0);

/// Takes a target from the pool, binds it and clears it.
///
/// Usually the first component of a plan that draws into a fresh target
/// rather than into the output of an earlier pass.
#[derive(Debug, Clone)]
pub struct CreateTargetComponent {
    name: String,
    info: RenderTargetInfo,
    clear_colour: LinearRgba,
}

impl CreateTargetComponent {
    /// Outputs the target as `name`.
    pub fn new(info: RenderTargetInfo, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info,
            clear_colour: LinearRgba::TRANSPARENT,
        }
    }

    /// Outputs the target under a generated name, unique in the process.
    pub fn anonymous(info: RenderTargetInfo) -> Self {
        let index = ANONYMOUS_TARGETS.fetch_add(1, Ordering::Relaxed);
        Self::new(info, format!("anonymous_target_{index}"))
    }

    /// The colour the target is cleared to.
    pub fn with_clear_colour(mut self, colour: LinearRgba) -> Self {
        self.clear_colour = colour;
        self
    }

    /// The name of the produced resource.
    pub fn resource_name(&self) -> &str {
        &self.name
    }
}

impl RendererComponent for CreateTargetComponent {
    fn name(&self) -> &str {
        "create_target"
    }

    fn initialise(
        &mut self,
        _cx: &InitialiseContext<'_>,
        resources: &mut ResourceContext,
    ) -> Result<(), PlanError> {
        resources.define_output(&self.name, true, None, self.info.clone())
    }

    fn draw(&mut self, cx: &mut DrawContext<'_>) -> Result<(), RenderError> {
        let target = cx.get_target(&self.info)?;
        cx.device.set_render_targets(&[target])?;
        cx.device.clear(ClearOptions::all(self.clear_colour))?;
        cx.output(&self.name, target)
    }
}
