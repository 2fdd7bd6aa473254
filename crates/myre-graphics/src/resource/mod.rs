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

//! Named resources exchanged between renderer components.

mod context;

pub use self::context::ResourceContext;

use crate::error::TargetError;
use crate::render_target::{RenderTargetInfo, RenderTargetManager};
use myre_core::renderer::TextureId;
use std::fmt;
use std::sync::Arc;

/// A custom cleanup action for a resource.
pub type FinaliserFn =
    dyn Fn(&mut RenderTargetManager, TextureId) -> Result<(), TargetError> + Send + Sync;

/// What happens to a resource's target once nothing needs it any more.
#[derive(Clone, Default)]
pub enum Finaliser {
    /// Hand the target back to the pool.
    #[default]
    ReturnToPool,
    /// Do nothing. For targets the pool does not own.
    Keep,
    /// Run a custom action.
    Custom(Arc<FinaliserFn>),
}

impl Finaliser {
    /// Wraps a closure.
    pub fn custom<F>(finalise: F) -> Self
    where
        F: Fn(&mut RenderTargetManager, TextureId) -> Result<(), TargetError>
            + Send
            + Sync
            + 'static,
    {
        Finaliser::Custom(Arc::new(finalise))
    }

    /// Runs the action on `target`.
    pub fn run(
        &self,
        targets: &mut RenderTargetManager,
        target: TextureId,
    ) -> Result<(), TargetError> {
        match self {
            Finaliser::ReturnToPool => targets.recycle_target(target),
            Finaliser::Keep => Ok(()),
            Finaliser::Custom(finalise) => finalise(targets, target),
        }
    }
}

impl fmt::Debug for Finaliser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finaliser::ReturnToPool => f.write_str("ReturnToPool"),
            Finaliser::Keep => f.write_str("Keep"),
            Finaliser::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The declaration of a named resource.
#[derive(Debug, Clone)]
pub struct ResourceInfo {
    /// Name, unique among the outputs of one plan.
    pub name: String,
    /// Shape of the target that satisfies the resource.
    pub format: RenderTargetInfo,
    /// Whether the producing component leaves the target bound after drawing.
    pub is_left_set: bool,
    /// Cleanup action once the resource is dead.
    pub finaliser: Finaliser,
}

impl ResourceInfo {
    /// A resource returned to the pool when finalised.
    pub fn new(name: impl Into<String>, format: RenderTargetInfo, is_left_set: bool) -> Self {
        Self {
            name: name.into(),
            format,
            is_left_set,
            finaliser: Finaliser::ReturnToPool,
        }
    }

    /// Replaces the finaliser.
    pub fn with_finaliser(mut self, finaliser: Finaliser) -> Self {
        self.finaliser = finaliser;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myre_core::math::Extent2D;
    use myre_core::renderer::{HeadlessDevice, TextureFormat};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn finalisers() {
        let device = HeadlessDevice::new(Extent2D::new(32, 32));
        let mut pool = RenderTargetManager::new();
        let info = RenderTargetInfo::auto(TextureFormat::Rgba8Unorm);
        let id = pool.get_target(&device, &info).unwrap();

        Finaliser::Keep.run(&mut pool, id).unwrap();
        assert!(pool.is_in_use(id));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let custom = Finaliser::custom(move |targets, target| {
            counter.fetch_add(1, Ordering::Relaxed);
            targets.recycle_target(target)
        });
        custom.run(&mut pool, id).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(!pool.is_in_use(id));

        assert_eq!(
            Finaliser::ReturnToPool.run(&mut pool, id),
            Err(TargetError::NotInUse(id))
        );
    }
}
