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

//! # Myre Core
//!
//! Foundational crate containing the traits, value types and interface contracts
//! shared by the deferred renderer and its backends.
//!
//! - [`renderer`]: the backend-agnostic [`GraphicsDevice`](renderer::GraphicsDevice)
//!   contract, render-target descriptors and the rendering error hierarchy.
//! - [`metadata`]: the strongly-typed per-view metadata store.
//! - [`scene`]: capability lookup used by renderer components to find their
//!   collaborators (geometry providers, light managers, ...).

#![warn(missing_docs)]

pub mod math;
pub mod metadata;
pub mod renderer;
pub mod scene;

pub use metadata::{MetadataError, MetadataKey, MetadataValue, RendererMetadata};
pub use scene::Scene;
