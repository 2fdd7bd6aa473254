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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" for all device-level operations the
//! deferred renderer performs. It contains the abstract [`GraphicsDevice`] trait,
//! the render-target descriptors and formats it works with, the fixed-function
//! pipeline state, and the error types that form the stable API for rendering.
//!
//! The 'how' is handled by a concrete backend (see the `myre-infra` crate for the
//! `wgpu` implementation, or [`HeadlessDevice`] for an in-memory one), while the
//! render plan and its components only ever talk to these traits.

pub mod api;
pub mod error;
pub mod headless;
pub mod traits;

pub use self::api::*;
pub use self::error::{RenderError, ResourceError};
pub use self::headless::{HeadlessDevice, HeadlessStats};
pub use self::traits::GraphicsDevice;
