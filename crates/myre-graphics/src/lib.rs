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

//! # Myre Graphics
//!
//! The deferred renderer. A frame is described by a [`RenderPlan`]: an ordered
//! list of [`RendererComponent`]s that exchange render targets through named
//! resources. Transient targets come from a shared [`RenderTargetManager`] pool
//! and go back to it as soon as the last component that needs them has drawn.
//!
//! - [`render_target`]: target shapes and the pooling allocator.
//! - [`resource`]: resource declarations and the per-component negotiation context.
//! - [`component`]: the renderer component contract.
//! - [`plan`]: plan construction, validation and execution.
//! - [`view`]: cameras and views, including per-renderer plan caching.
//! - [`renderer`]: the per-frame driver compositing every view to the screen.
//! - [`components`]: the stock deferred pipeline components.

#![warn(missing_docs)]

pub mod component;
pub mod components;
pub mod error;
pub mod plan;
pub mod render_target;
pub mod renderer;
pub mod resource;
pub mod settings;
pub mod view;

pub use component::{DrawContext, InitialiseContext, RendererComponent};
pub use error::{PlanError, TargetError};
pub use plan::{FrameContext, PlanBuilder, PlanFactory, PlanOutput, RenderPlan};
pub use render_target::{PoolStats, RenderTargetInfo, RenderTargetManager};
pub use renderer::{FrameOutcome, Renderer, RendererId};
pub use resource::{Finaliser, ResourceContext, ResourceInfo};
pub use settings::RendererSettings;
pub use view::{Camera, CameraView, PlanView, View};
