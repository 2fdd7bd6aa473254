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

use super::blit::{BlitKey, BlitPass, Blitter};
use super::conversions::IntoWgpu;
use anyhow::{anyhow, Result};
use myre_core::math::{Extent2D, Viewport};
use myre_core::renderer::{
    ClearOptions, DepthFormat, GraphicsDevice, PipelineState, RenderError, RenderTargetDescriptor,
    ResourceError, SamplerFilter, SampleCount, TextureFormat, TextureId,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Format of the off-screen back buffer views are composited into.
pub const BACK_BUFFER_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

const MAX_BOUND_TARGETS: usize = 8;

#[derive(Debug)]
struct DepthAttachment {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: DepthFormat,
}

#[derive(Debug)]
struct WgpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    depth: Option<DepthAttachment>,
    size: Extent2D,
    format: TextureFormat,
    sample_count: u32,
}

#[derive(Debug)]
struct DeviceState {
    next_id: usize,
    targets: HashMap<TextureId, WgpuTarget>,
    bound: Vec<TextureId>,
    pipeline: PipelineState,
    back_buffer: WgpuTarget,
}

impl DeviceState {
    fn target(&self, id: TextureId) -> Result<&WgpuTarget, ResourceError> {
        self.targets.get(&id).ok_or(ResourceError::NotFound(id))
    }

    /// The surface draws currently land on: the first bound target, or the back
    /// buffer when nothing is bound.
    fn surface(&self) -> Result<&WgpuTarget, ResourceError> {
        match self.bound.first() {
            Some(id) => self.target(*id),
            None => Ok(&self.back_buffer),
        }
    }
}

/// A [`GraphicsDevice`] backed by `wgpu`.
///
/// Render targets are plain textures with an optional depth texture attached.
/// The back buffer is an off-screen texture of [`BACK_BUFFER_FORMAT`]; embedding
/// applications copy or present it themselves through [`WgpuDevice::back_buffer_view`].
///
/// Scene collaborators reach the raw `wgpu` objects by downcasting through
/// [`GraphicsDevice::as_any`].
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    blitter: Blitter,
    state: Mutex<DeviceState>,
    lost: Arc<AtomicBool>,
}

impl WgpuDevice {
    /// Creates a device on the default adapter without a window surface.
    ///
    /// ## Arguments
    /// * `back_buffer` - The initial size of the back buffer.
    ///
    /// ## Errors
    /// Fails when no adapter is available or the logical device cannot be created.
    pub fn new_headless(back_buffer: Extent2D) -> Result<Self> {
        pollster::block_on(Self::new_async(back_buffer))
    }

    async fn new_async(back_buffer: Extent2D) -> Result<Self> {
        if back_buffer.is_empty() {
            return Err(anyhow!("Back buffer size must not be empty"));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to find a suitable graphics adapter: {}", e))?;
        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Myre Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::error!("WGPU device lost ({reason:?}): {message}");
            flag.store(true, Ordering::Release);
        });
        let flag = lost.clone();
        device.on_uncaptured_error(Arc::new(move |e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
            if matches!(e, wgpu::Error::OutOfMemory { .. }) {
                flag.store(true, Ordering::Release);
            }
        }));

        let blitter = Blitter::new(&device);
        let back_buffer = create_target(
            &device,
            &RenderTargetDescriptor {
                label: Some("myre_back_buffer".into()),
                size: back_buffer,
                format: BACK_BUFFER_FORMAT,
                depth_format: DepthFormat::None,
                sample_count: SampleCount::X1,
                mip_level_count: 1,
                usage: Default::default(),
            },
        );

        Ok(Self {
            device,
            queue,
            adapter_info,
            blitter,
            state: Mutex::new(DeviceState {
                next_id: 1,
                targets: HashMap::new(),
                bound: Vec::new(),
                pipeline: PipelineState::default(),
                back_buffer,
            }),
            lost,
        })
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_alive(&self) -> Result<(), ResourceError> {
        if self.is_lost() {
            Err(ResourceError::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn submit(&self, label: &str, record: impl FnOnce(&mut wgpu::CommandEncoder)) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        record(&mut encoder);
        self.queue.submit(Some(encoder.finish()));
    }

    /// Returns `true` once the driver reported the device as lost. A lost device
    /// never recovers; a new `WgpuDevice` has to be created.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Information about the adapter this device runs on.
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// The underlying `wgpu` device.
    pub fn wgpu_device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue commands are submitted to.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The colour view of a render target, for collaborators recording their
    /// own passes.
    pub fn target_view(&self, id: TextureId) -> Option<wgpu::TextureView> {
        self.lock().targets.get(&id).map(|target| target.view.clone())
    }

    /// The depth view of a render target, if it has one.
    pub fn depth_view(&self, id: TextureId) -> Option<wgpu::TextureView> {
        let state = self.lock();
        let depth = state.targets.get(&id)?.depth.as_ref()?;
        Some(depth.view.clone())
    }

    /// The view of the off-screen back buffer.
    pub fn back_buffer_view(&self) -> wgpu::TextureView {
        self.lock().back_buffer.view.clone()
    }

    /// Recreates the back buffer with a new size. Its contents are lost.
    pub fn resize(&self, size: Extent2D) {
        if size.is_empty() {
            log::warn!("Ignoring resize of the back buffer to an empty size");
            return;
        }
        let mut state = self.lock();
        state.back_buffer = create_target(
            &self.device,
            &RenderTargetDescriptor {
                label: Some("myre_back_buffer".into()),
                size,
                format: BACK_BUFFER_FORMAT,
                depth_format: DepthFormat::None,
                sample_count: SampleCount::X1,
                mip_level_count: 1,
                usage: Default::default(),
            },
        );
        log::debug!("Back buffer resized to {}x{}", size.width, size.height);
    }

    /// Number of blit pipeline variants built so far.
    pub fn blit_pipeline_count(&self) -> usize {
        self.blitter.pipeline_count()
    }
}

fn create_target(device: &wgpu::Device, descriptor: &RenderTargetDescriptor) -> WgpuTarget {
    let sample_count: u32 = descriptor.sample_count.into_wgpu();
    let size: wgpu::Extent3d = descriptor.size.into_wgpu();
    let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
    if sample_count == 1 {
        usage |= wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST;
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: descriptor.label.as_deref(),
        size,
        mip_level_count: descriptor.mip_level_count.max(1),
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: descriptor.format.into_wgpu(),
        usage,
        view_formats: &[],
    });
    // Attachments may only reference a single mip level.
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: descriptor.label.as_deref(),
        base_mip_level: 0,
        mip_level_count: Some(1),
        ..Default::default()
    });

    let depth_format: Option<wgpu::TextureFormat> = descriptor.depth_format.into_wgpu();
    let depth = depth_format.map(|format| {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        DepthAttachment {
            _texture: texture,
            view,
            format: descriptor.depth_format,
        }
    });

    WgpuTarget {
        texture,
        view,
        depth,
        size: descriptor.size,
        format: descriptor.format,
        sample_count,
    }
}

fn viewport_within(viewport: Viewport, surface: Extent2D) -> Option<[f32; 4]> {
    let x = viewport.x.min(surface.width);
    let y = viewport.y.min(surface.height);
    let width = viewport.width.min(surface.width - x);
    let height = viewport.height.min(surface.height - y);
    if width == 0 || height == 0 {
        None
    } else {
        Some([x as f32, y as f32, width as f32, height as f32])
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<TextureId, ResourceError> {
        self.check_alive()?;
        let name = descriptor.label.as_deref().unwrap_or("unnamed");
        if descriptor.size.is_empty() {
            return Err(ResourceError::UnsupportedFormat(format!(
                "render target '{name}' has an empty size"
            )));
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if descriptor.size.width > max || descriptor.size.height > max {
            return Err(ResourceError::UnsupportedFormat(format!(
                "render target '{name}' is larger than the device limit of {max}"
            )));
        }
        if descriptor.sample_count != SampleCount::X1 && descriptor.mip_level_count > 1 {
            return Err(ResourceError::UnsupportedFormat(format!(
                "multisampled render target '{name}' cannot have mip levels"
            )));
        }

        let target = create_target(&self.device, descriptor);
        let mut state = self.lock();
        let id = TextureId(state.next_id);
        state.next_id += 1;
        log::trace!(
            "Created render target {id} '{name}' ({}x{} {:?})",
            target.size.width,
            target.size.height,
            target.format
        );
        state.targets.insert(id, target);
        Ok(id)
    }

    fn destroy_render_target(&self, id: TextureId) -> Result<(), ResourceError> {
        self.check_alive()?;
        let mut state = self.lock();
        let target = state.targets.remove(&id).ok_or(ResourceError::NotFound(id))?;
        state.bound.retain(|bound| *bound != id);
        target.texture.destroy();
        Ok(())
    }

    fn render_target_size(&self, id: TextureId) -> Result<Extent2D, ResourceError> {
        self.check_alive()?;
        Ok(self.lock().target(id)?.size)
    }

    fn back_buffer_size(&self) -> Extent2D {
        self.lock().back_buffer.size
    }

    fn set_render_targets(&self, targets: &[TextureId]) -> Result<(), RenderError> {
        self.check_alive()?;
        if targets.len() > MAX_BOUND_TARGETS {
            return Err(RenderError::RenderingFailed(format!(
                "cannot bind {} render targets at once, the limit is {MAX_BOUND_TARGETS}",
                targets.len()
            )));
        }

        let mut state = self.lock();
        let mut shape = None;
        for id in targets {
            let target = state.target(*id)?;
            let this = (target.size, target.sample_count);
            match shape {
                None => shape = Some(this),
                Some(first) if first != this => {
                    return Err(RenderError::RenderingFailed(format!(
                        "{id} does not match the size and sample count of the other bound targets"
                    )));
                }
                Some(_) => {}
            }
        }
        state.bound = targets.to_vec();
        Ok(())
    }

    fn render_targets(&self) -> Vec<TextureId> {
        self.lock().bound.clone()
    }

    fn clear(&self, options: ClearOptions) -> Result<(), RenderError> {
        self.check_alive()?;
        let state = self.lock();

        let color_load: wgpu::LoadOp<wgpu::Color> = match options.color {
            Some(color) => wgpu::LoadOp::Clear(color.into_wgpu()),
            None => wgpu::LoadOp::Load,
        };
        let color_ops = wgpu::Operations {
            load: color_load,
            store: wgpu::StoreOp::Store,
        };

        let surfaces: Vec<&WgpuTarget> = if state.bound.is_empty() {
            vec![&state.back_buffer]
        } else {
            state
                .bound
                .iter()
                .map(|id| state.target(*id))
                .collect::<Result<_, _>>()?
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = surfaces
            .iter()
            .map(|target| {
                Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: color_ops,
                    depth_slice: None,
                })
            })
            .collect();

        let depth = surfaces.iter().find_map(|target| target.depth.as_ref());
        let depth_stencil_attachment = depth.map(|depth| wgpu::RenderPassDepthStencilAttachment {
            view: &depth.view,
            depth_ops: Some(wgpu::Operations {
                load: options
                    .depth
                    .map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: depth.format.has_stencil().then(|| wgpu::Operations {
                load: options
                    .stencil
                    .map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                store: wgpu::StoreOp::Store,
            }),
        });

        self.submit("myre_clear", |encoder| {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("myre_clear_pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        });
        Ok(())
    }

    fn pipeline_state(&self) -> PipelineState {
        self.lock().pipeline
    }

    fn set_pipeline_state(&self, pipeline: PipelineState) {
        self.lock().pipeline = pipeline;
    }

    fn resample(&self, source: TextureId, destination: TextureId) -> Result<(), RenderError> {
        self.check_alive()?;
        if source == destination {
            return Err(RenderError::RenderingFailed(format!(
                "cannot resample {source} into itself"
            )));
        }

        let state = self.lock();
        let from = state.target(source)?;
        let to = state.target(destination)?;
        if from.format != to.format {
            return Err(ResourceError::UnsupportedFormat(format!(
                "cannot resample {:?} into {:?}",
                from.format, to.format
            ))
            .into());
        }
        if from.sample_count > 1 {
            return Err(ResourceError::BackendError(format!(
                "{source} is multisampled and cannot be resampled"
            ))
            .into());
        }

        let key = BlitKey {
            format: to.format.into_wgpu(),
            filter: SamplerFilter::Linear,
            sample_count: to.sample_count,
        };
        self.submit("myre_resample", |encoder| {
            self.blitter.record(
                &self.device,
                encoder,
                BlitPass {
                    source: &from.view,
                    destination: &to.view,
                    key,
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    viewport: None,
                },
            );
        });
        Ok(())
    }

    fn composite(
        &self,
        source: TextureId,
        viewport: Viewport,
        filter: SamplerFilter,
    ) -> Result<(), RenderError> {
        self.check_alive()?;
        let state = self.lock();
        let image = state.target(source)?;
        if state.bound.contains(&source) {
            return Err(RenderError::RenderingFailed(format!(
                "{source} is bound as a render target and cannot be sampled"
            )));
        }
        if image.sample_count > 1 {
            return Err(ResourceError::BackendError(format!(
                "{source} is multisampled and cannot be composited"
            ))
            .into());
        }

        let surface = state.surface()?;
        let Some(region) = viewport_within(viewport, surface.size) else {
            log::debug!("Composite of {source} skipped, viewport lies outside the surface");
            return Ok(());
        };
        let key = BlitKey {
            format: surface.format.into_wgpu(),
            filter,
            sample_count: surface.sample_count,
        };
        self.submit("myre_composite", |encoder| {
            self.blitter.record(
                &self.device,
                encoder,
                BlitPass {
                    source: &image.view,
                    destination: &surface.view,
                    key,
                    load: wgpu::LoadOp::Load,
                    viewport: Some(region),
                },
            );
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myre_core::math::LinearRgba;

    // Tests are skipped on machines without a usable adapter.
    fn test_device() -> Option<WgpuDevice> {
        match WgpuDevice::new_headless(Extent2D::new(64, 64)) {
            Ok(device) => Some(device),
            Err(e) => {
                eprintln!("Skipping GPU test: {e}");
                None
            }
        }
    }

    fn descriptor(
        width: u32,
        height: u32,
        format: TextureFormat,
        depth_format: DepthFormat,
    ) -> RenderTargetDescriptor<'static> {
        RenderTargetDescriptor {
            label: Some("test_target".into()),
            size: Extent2D::new(width, height),
            format,
            depth_format,
            sample_count: SampleCount::X1,
            mip_level_count: 1,
            usage: Default::default(),
        }
    }

    #[test]
    fn test_viewport_is_clamped_to_the_surface() {
        let surface = Extent2D::new(100, 50);
        assert_eq!(
            viewport_within(Viewport::new(0, 0, 100, 50), surface),
            Some([0.0, 0.0, 100.0, 50.0])
        );
        assert_eq!(
            viewport_within(Viewport::new(80, 40, 100, 100), surface),
            Some([80.0, 40.0, 20.0, 10.0])
        );
        assert_eq!(viewport_within(Viewport::new(200, 0, 10, 10), surface), None);
    }

    #[test]
    fn test_targets_are_created_and_destroyed() {
        let Some(device) = test_device() else {
            return;
        };
        let id = device
            .create_render_target(&descriptor(
                32,
                16,
                TextureFormat::R32Float,
                DepthFormat::Depth24PlusStencil8,
            ))
            .unwrap();
        assert_eq!(device.render_target_size(id).unwrap(), Extent2D::new(32, 16));
        assert!(device.target_view(id).is_some());
        assert!(device.depth_view(id).is_some());

        device.destroy_render_target(id).unwrap();
        assert_eq!(
            device.render_target_size(id),
            Err(ResourceError::NotFound(id))
        );
    }

    #[test]
    fn test_empty_targets_are_rejected() {
        let Some(device) = test_device() else {
            return;
        };
        let result = device.create_render_target(&descriptor(
            0,
            16,
            TextureFormat::Rgba8Unorm,
            DepthFormat::None,
        ));
        assert!(matches!(result, Err(ResourceError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_bound_targets_must_share_a_size() {
        let Some(device) = test_device() else {
            return;
        };
        let big = device
            .create_render_target(&descriptor(32, 32, TextureFormat::Rgba8Unorm, DepthFormat::None))
            .unwrap();
        let small = device
            .create_render_target(&descriptor(16, 16, TextureFormat::Rgba8Unorm, DepthFormat::None))
            .unwrap();

        assert!(device.set_render_targets(&[big, small]).is_err());
        assert!(device.render_targets().is_empty());

        device.set_render_targets(&[big]).unwrap();
        device.destroy_render_target(big).unwrap();
        assert!(device.render_targets().is_empty());
    }

    #[test]
    fn test_clear_resample_and_composite() {
        let Some(device) = test_device() else {
            return;
        };
        let full = device
            .create_render_target(&descriptor(
                64,
                64,
                TextureFormat::Rgba16Float,
                DepthFormat::Depth32Float,
            ))
            .unwrap();
        let half = device
            .create_render_target(&descriptor(32, 32, TextureFormat::Rgba16Float, DepthFormat::None))
            .unwrap();

        device.set_render_targets(&[full]).unwrap();
        device.clear(ClearOptions::all(LinearRgba::WHITE)).unwrap();
        assert!(device.composite(full, Viewport::new(0, 0, 64, 64), SamplerFilter::Point).is_err());

        device.set_render_targets(&[]).unwrap();
        device.resample(full, half).unwrap();
        device.clear(ClearOptions::color(LinearRgba::BLACK)).unwrap();
        device
            .composite(half, Viewport::new(0, 0, 32, 64), SamplerFilter::Point)
            .unwrap();
        device
            .composite(half, Viewport::new(32, 0, 32, 64), SamplerFilter::Point)
            .unwrap();

        // One variant per (destination format, filter) pair.
        assert_eq!(device.blit_pipeline_count(), 2);
    }

    #[test]
    fn test_resample_requires_matching_formats() {
        let Some(device) = test_device() else {
            return;
        };
        let colour = device
            .create_render_target(&descriptor(8, 8, TextureFormat::Rgba8Unorm, DepthFormat::None))
            .unwrap();
        let depth = device
            .create_render_target(&descriptor(4, 4, TextureFormat::R32Float, DepthFormat::None))
            .unwrap();

        assert!(matches!(
            device.resample(colour, depth),
            Err(RenderError::ResourceError(ResourceError::UnsupportedFormat(_)))
        ));
        assert!(device.resample(colour, colour).is_err());
    }

    #[test]
    fn test_resize_replaces_the_back_buffer() {
        let Some(device) = test_device() else {
            return;
        };
        device.resize(Extent2D::new(320, 200));
        assert_eq!(device.back_buffer_size(), Extent2D::new(320, 200));
        device.resize(Extent2D::new(0, 200));
        assert_eq!(device.back_buffer_size(), Extent2D::new(320, 200));
    }
}
