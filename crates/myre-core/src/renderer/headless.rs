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

//! An in-memory [`GraphicsDevice`] with no GPU behind it.
//!
//! Render targets are bookkeeping entries with deterministic ids starting at 1.
//! Every operation is validated the way a real backend would validate it, and
//! counted, which makes the device suitable for tests, tooling and the sandbox.

use crate::math::{Extent2D, Viewport};
use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use crate::renderer::traits::GraphicsDevice;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters of the operations a [`HeadlessDevice`] has performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    /// Render targets created.
    pub targets_created: usize,
    /// Render targets destroyed.
    pub targets_destroyed: usize,
    /// Clears issued.
    pub clears: usize,
    /// Resamples issued.
    pub resamples: usize,
    /// Composites issued.
    pub composites: usize,
}

#[derive(Debug)]
struct HeadlessTarget {
    size: Extent2D,
    format: TextureFormat,
}

#[derive(Debug)]
struct HeadlessState {
    next_id: usize,
    targets: HashMap<TextureId, HeadlessTarget>,
    bound: Vec<TextureId>,
    pipeline: PipelineState,
    back_buffer: Extent2D,
    lost: bool,
    stats: HeadlessStats,
}

/// A [`GraphicsDevice`] that keeps all of its state in memory.
#[derive(Debug)]
pub struct HeadlessDevice {
    state: Mutex<HeadlessState>,
}

impl HeadlessDevice {
    /// Creates a device whose back buffer has the given size.
    pub fn new(back_buffer: Extent2D) -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                next_id: 1,
                targets: HashMap::new(),
                bound: Vec::new(),
                pipeline: PipelineState::default(),
                back_buffer,
                lost: false,
                stats: HeadlessStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resizes the back buffer.
    pub fn resize(&self, size: Extent2D) {
        self.lock().back_buffer = size;
    }

    /// Puts the device in the lost state. Every subsequent operation fails with
    /// `DeviceLost` until [`HeadlessDevice::reset`] is called.
    pub fn simulate_device_lost(&self) {
        let mut state = self.lock();
        state.lost = true;
        log::warn!("Headless device marked as lost");
    }

    /// Recovers from a device loss. All previously issued targets are gone.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.lost = false;
        state.targets.clear();
        state.bound.clear();
        state.pipeline = PipelineState::default();
    }

    /// Returns a snapshot of the operation counters.
    pub fn stats(&self) -> HeadlessStats {
        self.lock().stats
    }

    /// Number of targets currently alive on the device.
    pub fn live_targets(&self) -> usize {
        self.lock().targets.len()
    }

    /// Returns `true` if `id` refers to a live target.
    pub fn contains(&self, id: TextureId) -> bool {
        self.lock().targets.contains_key(&id)
    }
}

impl HeadlessState {
    fn check_alive(&self) -> Result<(), ResourceError> {
        if self.lost {
            Err(ResourceError::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn target(&self, id: TextureId) -> Result<&HeadlessTarget, ResourceError> {
        self.check_alive()?;
        self.targets.get(&id).ok_or(ResourceError::NotFound(id))
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let mut state = self.lock();
        state.check_alive()?;
        if descriptor.size.is_empty() {
            return Err(ResourceError::UnsupportedFormat(format!(
                "render target '{}' has an empty size",
                descriptor.label.as_deref().unwrap_or("unnamed")
            )));
        }

        let id = TextureId(state.next_id);
        state.next_id += 1;
        state.targets.insert(
            id,
            HeadlessTarget {
                size: descriptor.size,
                format: descriptor.format,
            },
        );
        state.stats.targets_created += 1;
        Ok(id)
    }

    fn destroy_render_target(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.lock();
        state.check_alive()?;
        state
            .targets
            .remove(&id)
            .ok_or(ResourceError::NotFound(id))?;
        state.bound.retain(|bound| *bound != id);
        state.stats.targets_destroyed += 1;
        Ok(())
    }

    fn render_target_size(&self, id: TextureId) -> Result<Extent2D, ResourceError> {
        Ok(self.lock().target(id)?.size)
    }

    fn back_buffer_size(&self) -> Extent2D {
        self.lock().back_buffer
    }

    fn set_render_targets(&self, targets: &[TextureId]) -> Result<(), RenderError> {
        let mut state = self.lock();
        for id in targets {
            state.target(*id)?;
        }
        state.bound = targets.to_vec();
        Ok(())
    }

    fn render_targets(&self) -> Vec<TextureId> {
        self.lock().bound.clone()
    }

    fn clear(&self, _options: ClearOptions) -> Result<(), RenderError> {
        let mut state = self.lock();
        state.check_alive()?;
        state.stats.clears += 1;
        Ok(())
    }

    fn pipeline_state(&self) -> PipelineState {
        self.lock().pipeline
    }

    fn set_pipeline_state(&self, pipeline: PipelineState) {
        self.lock().pipeline = pipeline;
    }

    fn resample(&self, source: TextureId, destination: TextureId) -> Result<(), RenderError> {
        let mut state = self.lock();
        let source_format = state.target(source)?.format;
        let destination_format = state.target(destination)?.format;
        if source_format != destination_format {
            return Err(ResourceError::UnsupportedFormat(format!(
                "cannot resample {source_format:?} into {destination_format:?}"
            ))
            .into());
        }
        state.stats.resamples += 1;
        Ok(())
    }

    fn composite(
        &self,
        source: TextureId,
        _viewport: Viewport,
        _filter: SamplerFilter,
    ) -> Result<(), RenderError> {
        let mut state = self.lock();
        state.target(source)?;
        if state.bound.contains(&source) {
            return Err(RenderError::RenderingFailed(format!(
                "{source} is bound as a render target and cannot be sampled"
            )));
        }
        state.stats.composites += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(width: u32, height: u32) -> RenderTargetDescriptor<'static> {
        RenderTargetDescriptor {
            label: None,
            size: Extent2D::new(width, height),
            format: TextureFormat::Rgba8Unorm,
            depth_format: DepthFormat::None,
            sample_count: SampleCount::X1,
            mip_level_count: 1,
            usage: RenderTargetUsage::DiscardContents,
        }
    }

    #[test]
    fn ids_are_deterministic() {
        let device = HeadlessDevice::new(Extent2D::new(64, 64));
        assert_eq!(device.create_render_target(&descriptor(8, 8)), Ok(TextureId(1)));
        assert_eq!(device.create_render_target(&descriptor(8, 8)), Ok(TextureId(2)));
        assert_eq!(device.stats().targets_created, 2);
    }

    #[test]
    fn empty_targets_are_rejected() {
        let device = HeadlessDevice::new(Extent2D::new(64, 64));
        assert!(matches!(
            device.create_render_target(&descriptor(0, 8)),
            Err(ResourceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn destroying_a_bound_target_unbinds_it() {
        let device = HeadlessDevice::new(Extent2D::new(64, 64));
        let id = device.create_render_target(&descriptor(8, 8)).unwrap();
        device.set_render_targets(&[id]).unwrap();
        device.destroy_render_target(id).unwrap();
        assert!(device.render_targets().is_empty());
        assert_eq!(
            device.destroy_render_target(id),
            Err(ResourceError::NotFound(id))
        );
    }

    #[test]
    fn lost_device_fails_every_operation() {
        let device = HeadlessDevice::new(Extent2D::new(64, 64));
        let id = device.create_render_target(&descriptor(8, 8)).unwrap();
        device.simulate_device_lost();

        assert_eq!(
            device.create_render_target(&descriptor(8, 8)),
            Err(ResourceError::DeviceLost)
        );
        assert!(device.set_render_targets(&[id]).unwrap_err().is_device_lost());
        assert!(device.clear(ClearOptions::color(Default::default())).unwrap_err().is_device_lost());

        device.reset();
        assert_eq!(device.live_targets(), 0);
        assert!(device.create_render_target(&descriptor(8, 8)).is_ok());
    }

    #[test]
    fn composite_refuses_bound_source() {
        let device = HeadlessDevice::new(Extent2D::new(64, 64));
        let id = device.create_render_target(&descriptor(8, 8)).unwrap();
        device.set_render_targets(&[id]).unwrap();
        let viewport = Viewport::full(Extent2D::new(64, 64));
        assert!(device.composite(id, viewport, SamplerFilter::Linear).is_err());

        device.set_render_targets(&[]).unwrap();
        assert!(device.composite(id, viewport, SamplerFilter::Linear).is_ok());
        assert_eq!(device.stats().composites, 1);
    }
}
