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

//! The per-frame driver.
//!
//! ```text
//! for each active view:  begin → execute plan → collect output → end
//! restore targets → clear back buffer → composite every output → finalise outputs
//! ```
//!
//! Compositing only starts once every view has executed, so no view's image
//! can be handed out of the pool to another view while it is still needed.

use crate::plan::{FrameContext, PlanBuilder, PlanFactory, PlanOutput, RenderPlan};
use crate::render_target::RenderTargetManager;
use crate::settings::RendererSettings;
use crate::view::View;
use myre_core::math::{Extent2D, Viewport};
use myre_core::metadata::names;
use myre_core::renderer::{ClearOptions, GraphicsDevice, PipelineState, RenderError, TextureId};
use myre_core::{RendererMetadata, Scene};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies a [`Renderer`] instance. Plans are built for one renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(u64);

impl RendererId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "renderer#{}", self.0)
    }
}

/// What happened to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was drawn.
    Rendered {
        /// Number of views composited.
        views: usize,
    },
    /// The device was lost. The pool has been invalidated and the next frame
    /// starts from scratch.
    Skipped,
}

/// Draws every registered [`View`] and composites them onto the back buffer.
pub struct Renderer {
    device: Arc<dyn GraphicsDevice>,
    scene: Arc<Scene>,
    factory: PlanFactory,
    pool: RenderTargetManager,
    metadata: RendererMetadata,
    settings: RendererSettings,
    default_plan: Option<RenderPlan>,
    views: Vec<Box<dyn View>>,
}

impl Renderer {
    /// Creates a renderer with no view and no default plan.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        scene: Arc<Scene>,
        settings: RendererSettings,
    ) -> Self {
        let id = RendererId::next();
        log::info!("Creating {id} with {settings:?}");
        Self {
            factory: PlanFactory::for_renderer(device.clone(), scene.clone(), id),
            pool: RenderTargetManager::with_soft_limit(settings.max_pooled_targets),
            device,
            scene,
            metadata: RendererMetadata::new(),
            settings,
            default_plan: None,
            views: Vec::new(),
        }
    }

    /// This renderer's id.
    pub fn id(&self) -> RendererId {
        self.factory.renderer()
    }

    /// The factory building plans for this renderer.
    pub fn factory(&self) -> &PlanFactory {
        &self.factory
    }

    /// Starts a plan for this renderer.
    pub fn start_plan(&self) -> PlanBuilder {
        self.factory
            .start_plan()
            .log_dead_outputs(self.settings.log_dead_outputs)
    }

    /// Makes `plan` the plan of views that do not provide their own. Returns
    /// the previous default plan, which the caller may dispose.
    pub fn set_plan(&mut self, plan: RenderPlan) -> Option<RenderPlan> {
        if plan.renderer() != self.id() {
            log::warn!(
                "Plan built for {} set as default plan of {}",
                plan.renderer(),
                self.id()
            );
        }
        self.default_plan.replace(plan)
    }

    /// The default plan, if any.
    pub fn plan(&self) -> Option<&RenderPlan> {
        self.default_plan.as_ref()
    }

    /// Appends a view. Views are drawn in the order they were added.
    pub fn add_view(&mut self, view: impl View + 'static) {
        self.views.push(Box::new(view));
    }

    /// Number of registered views, active or not.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Records the time elapsed since the previous frame, in seconds.
    pub fn update(&mut self, elapsed: f32) {
        self.metadata.write(names::TIME_DELTA, elapsed);
    }

    /// Drops every pooled target. Called when the device was reset and the
    /// targets it handed out are gone.
    pub fn notify_device_reset(&mut self) {
        self.pool.invalidate();
        self.metadata.release_textures();
    }

    /// The target pool.
    pub fn pool(&self) -> &RenderTargetManager {
        &self.pool
    }

    /// Metadata shared by every view.
    pub fn metadata(&self) -> &RendererMetadata {
        &self.metadata
    }

    /// Metadata shared by every view, mutably.
    pub fn metadata_mut(&mut self) -> &mut RendererMetadata {
        &mut self.metadata
    }

    /// The renderer's settings.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// Any error other than device loss raised by a view's plan or by
    /// compositing. Every view output collected so far is finalised first.
    pub fn draw(&mut self) -> Result<FrameOutcome, RenderError> {
        let back_buffer = self.device.back_buffer_size();
        let previous_targets = self.device.render_targets();

        let mut outputs: Vec<(PlanOutput, Viewport)> = Vec::new();
        let result = self
            .execute_views(back_buffer, &mut outputs)
            .and_then(|()| self.composite(&previous_targets, &outputs));
        if result.is_err() {
            self.restore_targets(&previous_targets);
        }
        let views = outputs.len();

        let mut finalised = Ok(());
        for (output, _) in outputs {
            if let Err(err) = output.finalise(&mut self.pool) {
                log::error!("Failed to finalise a view image: {err}");
                finalised = Err(RenderError::from(err));
            }
        }

        match result.and(finalised) {
            Ok(()) => Ok(FrameOutcome::Rendered { views }),
            Err(err) if err.is_device_lost() => {
                log::warn!("Device lost, skipping frame: {err}");
                self.pool.invalidate();
                Ok(FrameOutcome::Skipped)
            }
            Err(err) => Err(err),
        }
    }

    // A failed plan may leave its (already recycled) targets bound.
    fn restore_targets(&self, previous_targets: &[TextureId]) {
        if let Err(err) = self.device.set_render_targets(previous_targets) {
            log::debug!("Could not restore the render targets of the frame: {err}");
        }
        self.device.set_pipeline_state(PipelineState::default());
    }

    fn execute_views(
        &mut self,
        back_buffer: Extent2D,
        outputs: &mut Vec<(PlanOutput, Viewport)>,
    ) -> Result<(), RenderError> {
        let Renderer {
            device,
            scene,
            factory,
            pool,
            metadata,
            default_plan,
            views,
            ..
        } = self;

        for view in views.iter_mut().filter(|view| view.is_active()) {
            let viewport = view.viewport(back_buffer);
            if viewport.extent().is_empty() {
                log::debug!("View '{}' has an empty viewport, skipping", view.name());
                continue;
            }
            view.begin(&mut *metadata, viewport);

            let mut frame = FrameContext {
                device: &**device,
                targets: &mut *pool,
                metadata: &mut *metadata,
                scene: &**scene,
            };
            let executed = execute_view(&mut **view, default_plan, factory, &mut frame);

            metadata.release_textures();
            view.end(&mut *metadata);
            outputs.push((executed?, viewport));
        }
        Ok(())
    }

    fn composite(
        &self,
        previous_targets: &[TextureId],
        outputs: &[(PlanOutput, Viewport)],
    ) -> Result<(), RenderError> {
        self.device.set_render_targets(previous_targets)?;
        self.device.set_pipeline_state(PipelineState::default());
        self.device
            .clear(ClearOptions::all(self.settings.clear_colour))?;

        for (output, viewport) in outputs {
            let filter = self.settings.filter_for(output.resource.format.format);
            self.device.composite(output.image, *viewport, filter)?;
        }
        Ok(())
    }

    /// Disposes the default plan and every view.
    pub fn dispose(&mut self) {
        if let Some(mut plan) = self.default_plan.take() {
            plan.dispose(self.device.as_ref());
        }
        for view in &mut self.views {
            view.dispose(self.device.as_ref());
        }
        if let Err(err) = self.pool.clear(self.device.as_ref()) {
            log::warn!("Failed to release pooled targets: {err}");
        }
    }
}

fn execute_view(
    view: &mut dyn View,
    default_plan: &mut Option<RenderPlan>,
    factory: &PlanFactory,
    frame: &mut FrameContext<'_>,
) -> Result<PlanOutput, RenderError> {
    let plan = match view.plan(factory)? {
        Some(plan) => plan,
        None => default_plan.as_mut().ok_or(RenderError::NotInitialized)?,
    };
    plan.execute(frame)
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("id", &self.id())
            .field("views", &self.views.len())
            .field("default_plan", &self.default_plan)
            .field("pool", &self.pool.stats())
            .finish_non_exhaustive()
    }
}
