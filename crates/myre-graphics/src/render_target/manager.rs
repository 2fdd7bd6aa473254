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

//! The pooling render-target allocator.
//!
//! Creating and destroying GPU targets every frame is expensive, so targets are
//! kept for the lifetime of the device and handed out again to any request of
//! the same resolved shape. The pool grows until the set of shapes a frame uses
//! stops changing, which usually takes a couple of frames.

use super::info::RenderTargetInfo;
use crate::error::TargetError;
use myre_core::renderer::{GraphicsDevice, TextureId};
use std::collections::HashMap;

#[derive(Debug)]
struct PooledTarget {
    info: RenderTargetInfo,
    in_use: bool,
}

/// A snapshot of the pool occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Targets owned by the pool.
    pub allocated: usize,
    /// Targets currently handed out.
    pub in_use: usize,
    /// Targets available for reuse.
    pub free: usize,
}

/// Allocates render targets and recycles them by shape.
///
/// A target handed out by [`get_target`](Self::get_target) is never handed out
/// again until it comes back through [`recycle_target`](Self::recycle_target).
#[derive(Debug, Default)]
pub struct RenderTargetManager {
    pooled: HashMap<TextureId, PooledTarget>,
    free: HashMap<RenderTargetInfo, Vec<TextureId>>,
    soft_limit: Option<usize>,
}

impl RenderTargetManager {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty pool that warns once it owns more than `limit` targets.
    pub fn with_soft_limit(limit: usize) -> Self {
        Self {
            soft_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Returns a target of the requested shape, reusing a free one if possible.
    ///
    /// Automatic dimensions that are still unresolved are resolved against the
    /// device back buffer.
    /// ## Arguments
    /// * `device` - The device that allocates new targets.
    /// * `info` - The requested shape.
    /// ## Errors
    /// * `TargetError` - If the shape is invalid or the device fails to allocate.
    pub fn get_target(
        &mut self,
        device: &dyn GraphicsDevice,
        info: &RenderTargetInfo,
    ) -> Result<TextureId, TargetError> {
        let resolved = if info.is_auto() {
            info.resolve_to(device.back_buffer_size())
        } else {
            info.clone()
        };

        if let Some(id) = self.free.get_mut(&resolved).and_then(Vec::pop) {
            if let Some(target) = self.pooled.get_mut(&id) {
                target.in_use = true;
                return Ok(id);
            }
        }

        let id = device.create_render_target(&resolved.descriptor()?)?;
        log::debug!(
            "Allocated {} ({}x{} {:?}, depth {:?})",
            id,
            resolved.width,
            resolved.height,
            resolved.format,
            resolved.depth_format
        );
        self.pooled.insert(
            id,
            PooledTarget {
                info: resolved,
                in_use: true,
            },
        );

        if let Some(limit) = self.soft_limit {
            if self.pooled.len() > limit {
                log::warn!(
                    "Render target pool holds {} targets, above the soft limit of {}",
                    self.pooled.len(),
                    limit
                );
            }
        }
        Ok(id)
    }

    /// Returns a target to the pool so that a later request of the same shape
    /// can reuse it.
    ///
    /// # Errors
    /// [`TargetError::Untracked`] if the pool does not know the target and
    /// [`TargetError::NotInUse`] if it is already free. Both are logged.
    pub fn recycle_target(&mut self, id: TextureId) -> Result<(), TargetError> {
        let Some(target) = self.pooled.get_mut(&id) else {
            log::error!("Recycled {id}, which the render target pool does not track");
            return Err(TargetError::Untracked(id));
        };
        if !target.in_use {
            log::error!("Recycled {id} twice");
            return Err(TargetError::NotInUse(id));
        }

        target.in_use = false;
        self.free.entry(target.info.clone()).or_default().push(id);
        Ok(())
    }

    /// Forgets every target. Used after the device was reset, when every handle
    /// the pool owned is invalid. Nothing is destroyed on the device.
    pub fn invalidate(&mut self) {
        let stats = self.stats();
        if stats.allocated > 0 {
            log::warn!(
                "Invalidating render target pool ({} in use, {} free)",
                stats.in_use,
                stats.free
            );
        }
        self.pooled.clear();
        self.free.clear();
    }

    /// Destroys every free target. Targets in use are untouched.
    ///
    /// Every free target is removed from the pool even if the device fails to
    /// destroy some of them; the first failure is returned.
    pub fn clear(&mut self, device: &dyn GraphicsDevice) -> Result<(), TargetError> {
        let mut result: Result<(), TargetError> = Ok(());
        let mut destroyed = 0;
        for (_, ids) in self.free.drain() {
            for id in ids {
                self.pooled.remove(&id);
                match device.destroy_render_target(id) {
                    Ok(()) => destroyed += 1,
                    Err(err) => {
                        log::warn!("Failed to destroy pooled {id}: {err}");
                        if result.is_ok() {
                            result = Err(err.into());
                        }
                    }
                }
            }
        }
        log::info!("Released {destroyed} pooled render targets");
        result
    }

    /// Returns the shape of a pooled target.
    pub fn info(&self, id: TextureId) -> Option<&RenderTargetInfo> {
        self.pooled.get(&id).map(|target| &target.info)
    }

    /// Returns `true` if the target is currently handed out.
    pub fn is_in_use(&self, id: TextureId) -> bool {
        self.pooled.get(&id).is_some_and(|target| target.in_use)
    }

    /// Returns the current occupancy.
    pub fn stats(&self) -> PoolStats {
        let in_use = self.pooled.values().filter(|t| t.in_use).count();
        PoolStats {
            allocated: self.pooled.len(),
            in_use,
            free: self.pooled.len() - in_use,
        }
    }
}
