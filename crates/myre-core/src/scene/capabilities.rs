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

use crate::metadata::RendererMetadata;
use crate::renderer::{GraphicsDevice, RenderError};

/// Scene content that can draw itself into the currently bound targets.
///
/// The `phase` names the pass being rendered (`"gbuffer"`, `"translucent"`,
/// `"shadows_viewlength"`, ...). Providers ignore phases they take no part in.
pub trait GeometryProvider: Send + Sync {
    /// Draws this provider's geometry for `phase`.
    fn draw(
        &self,
        phase: &str,
        device: &dyn GraphicsDevice,
        metadata: &RendererMetadata,
    ) -> Result<(), RenderError>;
}

/// A manager for one type of light.
pub trait LightManager: Send + Sync {
    /// Called once per view before any light is drawn. May write derived values
    /// (e.g. shadow matrices) into `metadata`.
    fn prepare(
        &self,
        device: &dyn GraphicsDevice,
        metadata: &mut RendererMetadata,
    ) -> Result<(), RenderError>;

    /// Accumulates this manager's lights into the bound light buffer.
    fn draw(
        &self,
        device: &dyn GraphicsDevice,
        metadata: &RendererMetadata,
    ) -> Result<(), RenderError>;
}

/// Screen space 2D content drawn on top of the lit scene.
pub trait SpriteProvider: Send + Sync {
    /// Draws every sprite of this provider.
    fn draw_sprites(
        &self,
        device: &dyn GraphicsDevice,
        metadata: &RendererMetadata,
    ) -> Result<(), RenderError>;
}
