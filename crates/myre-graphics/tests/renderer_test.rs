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

mod common;

use common::{colour, Call, Journal, RecordingDevice, Stage};
use myre_core::math::{Extent2D, Viewport};
use myre_core::metadata::names;
use myre_core::renderer::{GraphicsDevice, RenderError, SamplerFilter, TextureFormat, TextureId};
use myre_core::{RendererMetadata, Scene};
use myre_graphics::{
    Camera, CameraView, FrameOutcome, PlanFactory, PlanView, RenderTargetInfo,
    RenderTargetManager, Renderer, RendererSettings, View,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn renderer(device: &Arc<RecordingDevice>) -> Renderer {
    let dyn_device: Arc<dyn GraphicsDevice> = device.clone();
    Renderer::new(dyn_device, Arc::new(Scene::new()), RendererSettings::default())
}

fn auto_colour() -> RenderTargetInfo {
    RenderTargetInfo::auto(TextureFormat::Rgba8Unorm)
}

#[test]
fn test_views_are_composited_after_every_plan_ran() {
    let device = RecordingDevice::new(800, 600);
    let journal = Journal::default();
    let mut renderer = renderer(&device);

    let plan = renderer
        .start_plan()
        .then(Stage::new("scene", &journal).writes("image", auto_colour(), true))
        .build()
        .unwrap();
    assert!(plan.apply(&mut renderer).is_none());

    let half = Viewport::new(0, 0, 400, 600);
    renderer.add_view(CameraView::new("main", Camera::default()));
    renderer.add_view(CameraView::new("inset", Camera::default()).with_viewport(half));

    assert_eq!(renderer.draw().unwrap(), FrameOutcome::Rendered { views: 2 });

    let calls: Vec<Call> = device
        .calls()
        .into_iter()
        .filter(|call| !matches!(call, Call::Create(_)))
        .collect();
    let [Call::SetTargets(first), Call::SetTargets(second), rest @ ..] = calls.as_slice() else {
        panic!("unexpected calls {calls:?}");
    };
    assert_ne!(first, second);
    assert_eq!(
        rest,
        [
            Call::SetTargets(vec![]),
            Call::Clear,
            Call::Composite(first[0], Viewport::new(0, 0, 800, 600), SamplerFilter::Linear),
            Call::Composite(second[0], half, SamplerFilter::Linear),
        ]
    );

    // Each view rendered at its own resolution.
    assert_eq!(device.size_of(first[0]), Some(Extent2D::new(800, 600)));
    assert_eq!(device.size_of(second[0]), Some(Extent2D::new(400, 600)));

    let stats = renderer.pool().stats();
    assert_eq!((stats.allocated, stats.in_use), (2, 0));

    renderer.draw().unwrap();
    assert_eq!(device.creates(), 2);
}

#[test]
fn test_float_images_are_point_filtered() {
    let device = RecordingDevice::new(64, 64);
    let journal = Journal::default();
    let mut renderer = renderer(&device);

    let hdr = RenderTargetInfo::auto(TextureFormat::Rgba16Float);
    let plan = renderer
        .start_plan()
        .then(Stage::new("hdr", &journal).writes("hdr", hdr, true))
        .build()
        .unwrap();
    renderer.set_plan(plan);
    renderer.add_view(CameraView::new("main", Camera::default()));

    renderer.draw().unwrap();
    assert!(device
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Composite(_, _, SamplerFilter::Point))));
}

#[test]
fn test_view_without_plan_is_an_error() {
    let device = RecordingDevice::new(64, 64);
    let mut renderer = renderer(&device);
    renderer.add_view(CameraView::new("main", Camera::default()));

    assert!(matches!(renderer.draw(), Err(RenderError::NotInitialized)));
}

#[test]
fn test_inactive_views_are_skipped() {
    let device = RecordingDevice::new(64, 64);
    let journal = Journal::default();
    let mut renderer = renderer(&device);
    let plan = renderer
        .start_plan()
        .then(Stage::new("scene", &journal).writes("image", auto_colour(), true))
        .build()
        .unwrap();
    renderer.set_plan(plan);

    let mut view = CameraView::new("main", Camera::default());
    view.active = false;
    renderer.add_view(view);

    assert_eq!(renderer.draw().unwrap(), FrameOutcome::Rendered { views: 0 });
    assert_eq!(journal.count("draw:scene"), 0);
    assert!(device.calls().contains(&Call::Clear));
}

#[test]
fn test_device_loss_skips_the_frame() {
    let device = RecordingDevice::new(64, 64);
    let journal = Journal::default();
    let mut renderer = renderer(&device);
    let plan = renderer
        .start_plan()
        .then(Stage::new("scene", &journal).writes("image", auto_colour(), true))
        .build()
        .unwrap();
    renderer.set_plan(plan);
    renderer.add_view(CameraView::new("main", Camera::default()));

    renderer.draw().unwrap();
    assert_eq!(renderer.pool().stats().free, 1);

    device.lose();
    assert_eq!(renderer.draw().unwrap(), FrameOutcome::Skipped);
    assert_eq!(renderer.pool().stats().allocated, 0);

    device.restore();
    assert_eq!(renderer.draw().unwrap(), FrameOutcome::Rendered { views: 1 });
    assert_eq!(device.creates(), 2);
}

#[test]
fn test_device_reset_empties_the_pool() {
    let device = RecordingDevice::new(256, 256);
    let info = colour(128, 128);
    let mut pool = RenderTargetManager::new();

    let targets: Vec<_> = (0..5)
        .map(|_| pool.get_target(&*device, &info).unwrap())
        .collect();
    pool.recycle_target(targets[0]).unwrap();
    pool.recycle_target(targets[1]).unwrap();
    let stats = pool.stats();
    assert_eq!((stats.in_use, stats.free), (3, 2));

    pool.invalidate();
    let stats = pool.stats();
    assert_eq!((stats.allocated, stats.in_use, stats.free), (0, 0, 0));

    for _ in 0..5 {
        let fresh = pool.get_target(&*device, &info).unwrap();
        assert!(!targets.contains(&fresh));
    }
    assert_eq!(device.creates(), 10);
}

#[test]
fn test_renderer_reset_notification() {
    let device = RecordingDevice::new(64, 64);
    let journal = Journal::default();
    let mut renderer = renderer(&device);
    let plan = renderer
        .start_plan()
        .then(Stage::new("scene", &journal).writes("image", auto_colour(), true))
        .build()
        .unwrap();
    renderer.set_plan(plan);
    renderer.add_view(CameraView::new("main", Camera::default()));

    renderer.draw().unwrap();
    renderer.notify_device_reset();
    assert_eq!(renderer.pool().stats().allocated, 0);

    renderer.draw().unwrap();
    assert_eq!(device.creates(), 2);
}

#[test]
fn test_plan_view_caches_one_plan_per_renderer() {
    let device = RecordingDevice::new(64, 64);
    let dyn_device: Arc<dyn GraphicsDevice> = device.clone();
    let scene = Arc::new(Scene::new());
    let journal = Journal::default();
    let builds = Arc::new(AtomicUsize::new(0));

    let build_journal = journal.clone();
    let build_count = builds.clone();
    let mut view = PlanView::new(CameraView::new("custom", Camera::default()), move |factory| {
        build_count.fetch_add(1, Ordering::Relaxed);
        factory
            .start_plan()
            .then(Stage::new("custom", &build_journal).writes("image", auto_colour(), true))
            .build()
    });

    let first = PlanFactory::new(dyn_device.clone(), scene.clone());
    let second = PlanFactory::new(dyn_device, scene);
    assert_ne!(first.renderer(), second.renderer());

    for _ in 0..3 {
        let plan = view.plan(&first).unwrap().unwrap();
        assert_eq!(plan.renderer(), first.renderer());
    }
    view.plan(&second).unwrap();
    assert_eq!(builds.load(Ordering::Relaxed), 2);
    assert_eq!(view.cached_plans(), 2);

    view.clear_cache();
    assert_eq!(view.cached_plans(), 0);
    assert_eq!(journal.count("dispose:custom"), 2);

    view.plan(&first).unwrap();
    assert_eq!(builds.load(Ordering::Relaxed), 3);
}

#[test]
fn test_plan_view_is_drawn_with_its_own_plan() {
    let device = RecordingDevice::new(64, 64);
    let journal = Journal::default();
    let mut renderer = renderer(&device);

    let view_journal = journal.clone();
    renderer.add_view(PlanView::new(
        CameraView::new("custom", Camera::default()),
        move |factory| {
            factory
                .start_plan()
                .then(Stage::new("custom", &view_journal).writes("image", auto_colour(), true))
                .build()
        },
    ));

    for _ in 0..3 {
        assert_eq!(renderer.draw().unwrap(), FrameOutcome::Rendered { views: 1 });
    }
    assert_eq!(journal.count("initialise:custom"), 1);
    assert_eq!(journal.count("draw:custom"), 3);

    drop(renderer);
    assert_eq!(journal.count("dispose:custom"), 1);
}

#[test]
fn test_update_writes_time_delta() {
    let device = RecordingDevice::new(64, 64);
    let mut renderer = renderer(&device);
    renderer.update(0.016);
    assert_eq!(renderer.metadata().read(names::TIME_DELTA), Ok(0.016));
}

#[test]
fn test_failed_frame_does_not_break_the_next_one() {
    let device = RecordingDevice::new(64, 64);
    let journal = Journal::default();
    let mut renderer = renderer(&device);
    let plan = renderer
        .start_plan()
        .then(
            Stage::new("scene", &journal)
                .writes("image", auto_colour(), true)
                .failing_once(),
        )
        .build()
        .unwrap();
    renderer.set_plan(plan);
    renderer.add_view(CameraView::new("main", Camera::default()));

    assert!(matches!(renderer.draw(), Err(RenderError::RenderingFailed(_))));
    assert!(device.render_targets().is_empty());
    assert_eq!(renderer.pool().stats().in_use, 0);

    assert_eq!(renderer.draw().unwrap(), FrameOutcome::Rendered { views: 1 });
    assert!(device.render_targets().is_empty());
    assert_eq!(device.creates(), 1);
    assert!(device
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Composite(..))));
}

struct CountingView {
    inner: CameraView,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl View for CountingView {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn viewport(&self, back_buffer: Extent2D) -> Viewport {
        self.inner.viewport(back_buffer)
    }

    fn begin(&mut self, metadata: &mut RendererMetadata, viewport: Viewport) {
        self.calls.lock().unwrap().push("begin");
        self.inner.begin(metadata, viewport);
    }

    fn end(&mut self, _metadata: &mut RendererMetadata) {
        self.calls.lock().unwrap().push("end");
    }
}

#[test]
fn test_view_is_ended_when_its_plan_fails() {
    let device = RecordingDevice::new(64, 64);
    let journal = Journal::default();
    let mut renderer = renderer(&device);
    let plan = renderer
        .start_plan()
        .then(
            Stage::new("scene", &journal)
                .writes("image", auto_colour(), true)
                .failing(),
        )
        .build()
        .unwrap();
    renderer.set_plan(plan);

    let calls = Arc::new(Mutex::new(Vec::new()));
    renderer.add_view(CountingView {
        inner: CameraView::new("main", Camera::default()),
        calls: calls.clone(),
    });

    assert!(renderer.draw().is_err());
    assert_eq!(*calls.lock().unwrap(), ["begin", "end"]);
}

#[test]
fn test_texture_metadata_does_not_outlive_the_plan() {
    let device = RecordingDevice::new(64, 64);
    let journal = Journal::default();
    let mut renderer = renderer(&device);
    let plan = renderer
        .start_plan()
        .then(
            Stage::new("scene", &journal)
                .writes("image", auto_colour(), true)
                .probe(|cx| cx.metadata.write(names::LIGHTBUFFER, Some(TextureId(99)))),
        )
        .build()
        .unwrap();
    renderer.set_plan(plan);
    renderer.add_view(CameraView::new("main", Camera::default()));
    renderer.update(0.016);

    renderer.draw().unwrap();
    assert!(!renderer.metadata().contains("lightbuffer"));
    assert_eq!(renderer.metadata().read(names::TIME_DELTA), Ok(0.016));

    renderer
        .metadata_mut()
        .write(names::GBUFFER_DEPTH, Some(TextureId(7)));
    renderer.notify_device_reset();
    assert!(!renderer.metadata().contains("gbuffer_depth"));
}
