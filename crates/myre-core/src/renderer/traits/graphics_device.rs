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

use crate::math::{Extent2D, Viewport};
use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use std::any::Any;
use std::fmt::Debug;

/// The device-level operations the deferred renderer needs.
///
/// The device owns global mutable state: the set of bound render targets and the
/// current [`PipelineState`]. Every component of a render plan sees the state the
/// previous one left behind. Implementations use interior mutability so that a
/// single device can be shared behind an `Arc` by the renderer, its plans and
/// the scene collaborators.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new render target.
    /// ## Arguments
    /// * `descriptor` - The shape of the target. Its size must be fully resolved.
    /// ## Returns
    /// A `Result` containing the ID of the created target.
    /// ## Errors
    /// * `ResourceError` - If the shape is unsupported or the device is lost.
    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<TextureId, ResourceError>;

    /// Destroys a render target and releases its memory.
    /// ## Arguments
    /// * `id` - The ID of the target to be destroyed.
    /// ## Errors
    /// * `ResourceError` - If the target does not exist.
    fn destroy_render_target(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Returns the size of an existing render target.
    fn render_target_size(&self, id: TextureId) -> Result<Extent2D, ResourceError>;

    /// Returns the size of the back buffer (the screen surface).
    fn back_buffer_size(&self) -> Extent2D;

    /// Binds a set of render targets for subsequent drawing.
    /// ## Arguments
    /// * `targets` - The targets to bind, in slot order. An empty slice binds the
    ///   back buffer.
    fn set_render_targets(&self, targets: &[TextureId]) -> Result<(), RenderError>;

    /// Returns the currently bound targets. Empty when the back buffer is bound.
    fn render_targets(&self) -> Vec<TextureId>;

    /// Clears the currently bound targets.
    fn clear(&self, options: ClearOptions) -> Result<(), RenderError>;

    /// Returns the current fixed-function state.
    fn pipeline_state(&self) -> PipelineState;

    /// Replaces the current fixed-function state.
    fn set_pipeline_state(&self, state: PipelineState);

    /// Copies `source` into `destination`, rescaling it to the destination size.
    fn resample(&self, source: TextureId, destination: TextureId) -> Result<(), RenderError>;

    /// Draws `source` as a full-screen quad into `viewport` of the currently bound
    /// surface.
    /// ## Arguments
    /// * `source` - The image to composite.
    /// * `viewport` - The region of the bound surface to cover, in pixels.
    /// * `filter` - The filter used when the image is sampled.
    fn composite(
        &self,
        source: TextureId,
        viewport: Viewport,
        filter: SamplerFilter,
    ) -> Result<(), RenderError>;

    /// Returns the device as `&dyn Any` for downcasting to a concrete backend.
    fn as_any(&self) -> &dyn Any;
}
