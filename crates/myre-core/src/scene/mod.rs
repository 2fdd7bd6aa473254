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

//! Capability lookup for renderer components.
//!
//! A [`Scene`] does not own the game objects that render; it only knows the
//! *managers* that do, grouped by the capability trait they implement. A
//! component asks for "every geometry provider" or "every light manager" and
//! gets them back in registration order, without the render graph ever owning
//! their lifetime.

mod capabilities;

pub use self::capabilities::{GeometryProvider, LightManager, SpriteProvider};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registry of scene managers, keyed by the capability they provide.
///
/// Capabilities are usually trait objects:
///
/// ```rust
/// use std::sync::Arc;
/// use myre_core::Scene;
///
/// trait Weather: Send + Sync {
///     fn wind(&self) -> f32;
/// }
///
/// struct Calm;
/// impl Weather for Calm {
///     fn wind(&self) -> f32 { 0.0 }
/// }
///
/// let mut scene = Scene::new();
/// scene.register::<dyn Weather>(Arc::new(Calm));
///
/// assert_eq!(scene.find_managers::<dyn Weather>().len(), 1);
/// ```
#[derive(Default)]
pub struct Scene {
    managers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a manager under capability `T`.
    ///
    /// The same manager may be registered under several capabilities.
    pub fn register<T>(&mut self, manager: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let slot = self
            .managers
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<Arc<T>>::new()));
        if let Some(list) = slot.downcast_mut::<Vec<Arc<T>>>() {
            list.push(manager);
        }
    }

    /// Returns every manager registered under capability `T`, in registration order.
    #[must_use]
    pub fn find_managers<T>(&self) -> &[Arc<T>]
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.managers
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<Vec<Arc<T>>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct capabilities with at least one manager.
    #[must_use]
    pub fn capability_count(&self) -> usize {
        self.managers.len()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("capabilities", &self.managers.len())
            .finish()
    }
}
