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

//! Error types of the render plan and the target pool.
//!
//! Both convert into [`RenderError`] so a frame only ever propagates one type.
//! Pool tracking failures become [`RenderError::Internal`]-class errors unless
//! they wrap a device error, and plan errors become
//! [`RenderError::Configuration`].

use myre_core::renderer::{RenderError, ResourceError, TextureId};
use thiserror::Error;

/// A failure of the [`RenderTargetManager`](crate::RenderTargetManager).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetError {
    /// The target was never handed out by this pool, or the pool was
    /// invalidated since.
    #[error("{0} is not tracked by the render target pool")]
    Untracked(TextureId),
    /// The target is already back in the pool. Usually a double recycle.
    #[error("{0} was recycled while not in use")]
    NotInUse(TextureId),
    /// A target with an automatic size was used where a concrete size is required.
    #[error("render target size is unresolved ({width}x{height})")]
    Unresolved {
        /// Declared width, `0` when automatic.
        width: u32,
        /// Declared height, `0` when automatic.
        height: u32,
    },
    /// The device cannot represent the multisample count.
    #[error("unsupported multisample count {0}")]
    UnsupportedMultisample(u8),
    /// The device failed to allocate or destroy a target.
    #[error("render target allocation failed: {0}")]
    Allocation(#[from] ResourceError),
}

/// A render plan configuration error, or a runtime violation of the contract
/// the plan was built with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A plan needs at least one component.
    #[error("a render plan needs at least one component")]
    EmptyPlan,
    /// A component asked for a resource that no earlier component produces.
    #[error("component '{component}' requires resource '{resource}', which no earlier component produces")]
    UnavailableInput {
        /// The offending component.
        component: String,
        /// The requested resource.
        resource: String,
    },
    /// Two components of one plan declared the same output.
    #[error("component '{component}' declares output '{resource}', which is already produced in this plan")]
    DuplicateOutput {
        /// The offending component.
        component: String,
        /// The duplicated resource.
        resource: String,
    },
    /// The plan was used after being disposed.
    #[error("component '{component}' is not initialised")]
    NotInitialised {
        /// The first component of the plan.
        component: String,
    },
    /// A declared resource has no target when it is read.
    #[error("component '{component}' read resource '{resource}', but it was never output")]
    MissingResource {
        /// The reading component.
        component: String,
        /// The missing resource.
        resource: String,
    },
    /// A component published a resource it did not declare.
    #[error("component '{component}' output resource '{resource}' without declaring it")]
    UndeclaredOutput {
        /// The offending component.
        component: String,
        /// The undeclared resource.
        resource: String,
    },
    /// A component declared an output as left set but left something else bound.
    #[error("component '{component}' declared '{resource}' as left set, but it is not bound after drawing")]
    BoundTargetMismatch {
        /// The offending component.
        component: String,
        /// The resource that should be bound.
        resource: String,
    },
    /// The requested final output is never produced.
    #[error("final output '{0}' is not produced by any component")]
    UnknownFinalOutput(String),
    /// No component declares any output, so there is no image to return.
    #[error("no component of the plan declares an output")]
    NoOutputs,
}

impl From<PlanError> for RenderError {
    fn from(err: PlanError) -> Self {
        RenderError::Configuration(Box::new(err))
    }
}

impl From<TargetError> for RenderError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::Allocation(err) => RenderError::ResourceError(err),
            other => RenderError::Internal(other.to_string()),
        }
    }
}
