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

//! Draws a few frames of the stock deferred pipeline.
//!
//! ```text
//! sandbox [--wgpu] [settings.json]
//! ```

use anyhow::{Context, Result};
use myre_core::math::{Extent2D, LinearRgba, Viewport};
use myre_core::metadata::names;
use myre_core::renderer::{GraphicsDevice, HeadlessDevice, RenderError, TextureFormat};
use myre_core::scene::{GeometryProvider, LightManager, SpriteProvider};
use myre_core::{RendererMetadata, Scene};
use myre_graphics::components::{
    CreateTargetComponent, GeometryBufferComponent, LightingComponent, ResampleComponent,
    SpriteComponent, TranslucentComponent,
};
use myre_graphics::{
    Camera, CameraView, FrameOutcome, PlanView, RenderTargetInfo, Renderer, RendererSettings,
};
use myre_infra::WgpuDevice;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const FRAMES: usize = 3;
const BACK_BUFFER: Extent2D = Extent2D::new(1280, 720);

#[derive(Default)]
struct DemoGeometry {
    draws: AtomicUsize,
}

impl GeometryProvider for DemoGeometry {
    fn draw(
        &self,
        phase: &str,
        _device: &dyn GraphicsDevice,
        metadata: &RendererMetadata,
    ) -> Result<(), RenderError> {
        let resolution = metadata.read(names::RESOLUTION)?;
        log::trace!("Drawing demo geometry for '{phase}' at {resolution}");
        self.draws.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

struct SunLight;

impl LightManager for SunLight {
    fn prepare(
        &self,
        _device: &dyn GraphicsDevice,
        metadata: &mut RendererMetadata,
    ) -> Result<(), RenderError> {
        metadata.write(names::SSAO, false);
        Ok(())
    }

    fn draw(
        &self,
        _device: &dyn GraphicsDevice,
        metadata: &RendererMetadata,
    ) -> Result<(), RenderError> {
        let normals = metadata.read(names::GBUFFER_NORMALS)?;
        log::trace!("Accumulating sun light from {normals:?}");
        Ok(())
    }
}

struct Crosshair;

impl SpriteProvider for Crosshair {
    fn draw_sprites(
        &self,
        _device: &dyn GraphicsDevice,
        _metadata: &RendererMetadata,
    ) -> Result<(), RenderError> {
        Ok(())
    }
}

fn load_settings(path: Option<&str>) -> Result<RendererSettings> {
    let Some(path) = path else {
        return Ok(RendererSettings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read renderer settings from '{path}'"))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid renderer settings in '{path}'"))
}

fn create_device(use_wgpu: bool) -> Result<Arc<dyn GraphicsDevice>> {
    if use_wgpu {
        let device = WgpuDevice::new_headless(BACK_BUFFER)?;
        log::info!("Rendering with wgpu on '{}'", device.adapter_info().name);
        Ok(Arc::new(device))
    } else {
        log::info!("Rendering with the headless device");
        Ok(Arc::new(HeadlessDevice::new(BACK_BUFFER)))
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let mut use_wgpu = false;
    let mut settings_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--wgpu" => use_wgpu = true,
            _ => settings_path = Some(arg),
        }
    }
    let settings = load_settings(settings_path.as_deref())?;

    let geometry = Arc::new(DemoGeometry::default());
    let mut scene = Scene::new();
    scene.register::<dyn GeometryProvider>(geometry.clone());
    scene.register::<dyn LightManager>(Arc::new(SunLight));
    scene.register::<dyn SpriteProvider>(Arc::new(Crosshair));

    let device = create_device(use_wgpu)?;
    let mut renderer = Renderer::new(device, Arc::new(scene), settings);

    let plan = renderer
        .start_plan()
        .then(GeometryBufferComponent::new())
        .then(LightingComponent::new())
        .then(TranslucentComponent::new())
        .then(SpriteComponent::new())
        .build()?;
    log::info!("Default plan: {}", plan.component_names().join(" -> "));
    plan.apply(&mut renderer);

    renderer.add_view(CameraView::new(
        "main",
        Camera::new_perspective(60f32.to_radians(), 0.1, 500.0),
    ));
    renderer.add_view(PlanView::new(
        CameraView::new("minimap", Camera::new_orthographic(64.0, 64.0, 0.1, 100.0))
            .with_viewport(Viewport::new(16, 16, 256, 256)),
        |factory| {
            factory
                .start_plan()
                .then(
                    CreateTargetComponent::new(
                        RenderTargetInfo::auto(TextureFormat::Rgba8Unorm),
                        "minimap",
                    )
                    .with_clear_colour(LinearRgba::rgb(0.1, 0.3, 0.1)),
                )
                .then(ResampleComponent::new("minimap", "minimap_small", 0.5))
                .build()
        },
    ));

    for frame in 0..FRAMES {
        renderer.update(1.0 / 60.0);
        match renderer.draw()? {
            FrameOutcome::Rendered { views } => {
                let stats = renderer.pool().stats();
                log::info!(
                    "Frame {frame}: {views} view(s), pool {} allocated / {} in use / {} free",
                    stats.allocated,
                    stats.in_use,
                    stats.free
                );
            }
            FrameOutcome::Skipped => log::warn!("Frame {frame} skipped, device lost"),
        }
    }

    log::info!(
        "Geometry drawn {} times over {FRAMES} frames",
        geometry.draws.load(Ordering::Relaxed)
    );
    renderer.dispose();
    Ok(())
}
