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

//! Views: what the renderer draws, and where on the screen it ends up.
//!
//! Each frame the [`Renderer`](crate::Renderer) asks every active view to
//! [`begin`](View::begin) (write its camera metadata), executes the view's plan,
//! and composites the resulting image into the view's viewport.

mod camera;
mod plan_view;

pub use self::camera::{Camera, Projection};
pub use self::plan_view::PlanView;

use crate::error::PlanError;
use crate::plan::{PlanFactory, RenderPlan};
use myre_core::math::{Extent2D, Viewport};
use myre_core::renderer::GraphicsDevice;
use myre_core::RendererMetadata;

/// Something the renderer draws once per frame.
pub trait View: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Inactive views are skipped.
    fn is_active(&self) -> bool {
        true
    }

    /// The region of the back buffer the view is composited into.
    fn viewport(&self, back_buffer: Extent2D) -> Viewport;

    /// Writes the view's metadata before its plan executes.
    fn begin(&mut self, metadata: &mut RendererMetadata, viewport: Viewport);

    /// The plan to execute for this view, or `None` for the renderer's default plan.
    fn plan(&mut self, _factory: &PlanFactory) -> Result<Option<&mut RenderPlan>, PlanError> {
        Ok(None)
    }

    /// Called after the view's plan has executed.
    fn end(&mut self, _metadata: &mut RendererMetadata) {}

    /// Releases anything the view owns on the device.
    fn dispose(&mut self, _device: &dyn GraphicsDevice) {}
}

/// A view of the scene from a [`Camera`], rendered with the renderer's
/// default plan.
#[derive(Debug, Clone)]
pub struct CameraView {
    name: String,
    /// The camera.
    pub camera: Camera,
    /// Target region in pixels. `None` covers the whole back buffer.
    pub viewport: Option<Viewport>,
    /// Whether the view is drawn.
    pub active: bool,
}

impl CameraView {
    /// A full-screen view.
    pub fn new(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            camera,
            viewport: None,
            active: true,
        }
    }

    /// Restricts the view to a region of the back buffer.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }
}

impl View for CameraView {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn viewport(&self, back_buffer: Extent2D) -> Viewport {
        self.viewport.unwrap_or(Viewport::full(back_buffer))
    }

    fn begin(&mut self, metadata: &mut RendererMetadata, viewport: Viewport) {
        self.camera.write_metadata(metadata, viewport);
    }
}
