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

use super::{CameraView, View};
use crate::error::PlanError;
use crate::plan::{PlanFactory, RenderPlan};
use crate::renderer::RendererId;
use myre_core::math::{Extent2D, Viewport};
use myre_core::renderer::GraphicsDevice;
use myre_core::RendererMetadata;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type BuildPlan = dyn Fn(&PlanFactory) -> Result<RenderPlan, PlanError> + Send;

struct CachedPlan {
    plan: RenderPlan,
    device: Arc<dyn GraphicsDevice>,
}

/// A camera view with its own rendering configuration.
///
/// A plan is built the first time the view is drawn by a given renderer and
/// cached for that renderer afterwards. [`clear_cache`](Self::clear_cache)
/// forces every plan to be rebuilt, e.g. after the configuration changed.
pub struct PlanView {
    view: CameraView,
    build: Box<BuildPlan>,
    plans: HashMap<RendererId, CachedPlan>,
}

impl PlanView {
    /// Creates a view that builds its plans with `build`.
    pub fn new<F>(view: CameraView, build: F) -> Self
    where
        F: Fn(&PlanFactory) -> Result<RenderPlan, PlanError> + Send + 'static,
    {
        Self {
            view,
            build: Box::new(build),
            plans: HashMap::new(),
        }
    }

    /// The underlying camera view.
    pub fn view(&self) -> &CameraView {
        &self.view
    }

    /// The underlying camera view, mutably.
    pub fn view_mut(&mut self) -> &mut CameraView {
        &mut self.view
    }

    /// Number of renderers this view currently caches a plan for.
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    /// Disposes every cached plan. They are rebuilt on the next draw.
    pub fn clear_cache(&mut self) {
        for (_, mut cached) in self.plans.drain() {
            cached.plan.dispose(cached.device.as_ref());
        }
    }
}

impl View for PlanView {
    fn name(&self) -> &str {
        self.view.name()
    }

    fn is_active(&self) -> bool {
        self.view.is_active()
    }

    fn viewport(&self, back_buffer: Extent2D) -> Viewport {
        self.view.viewport(back_buffer)
    }

    fn begin(&mut self, metadata: &mut RendererMetadata, viewport: Viewport) {
        self.view.begin(metadata, viewport);
    }

    fn plan(&mut self, factory: &PlanFactory) -> Result<Option<&mut RenderPlan>, PlanError> {
        let cached = match self.plans.entry(factory.renderer()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                log::debug!(
                    "Building plan of view '{}' for {:?}",
                    self.view.name(),
                    factory.renderer()
                );
                entry.insert(CachedPlan {
                    plan: (self.build)(factory)?,
                    device: factory.device().clone(),
                })
            }
        };
        Ok(Some(&mut cached.plan))
    }

    fn dispose(&mut self, _device: &dyn GraphicsDevice) {
        self.clear_cache();
    }
}

impl Drop for PlanView {
    fn drop(&mut self) {
        self.clear_cache();
    }
}

impl fmt::Debug for PlanView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanView")
            .field("view", &self.view)
            .field("cached_plans", &self.plans.len())
            .finish_non_exhaustive()
    }
}
