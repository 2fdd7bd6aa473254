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

#![allow(dead_code)]

use myre_core::math::{Extent2D, Viewport};
use myre_core::renderer::{
    ClearOptions, GraphicsDevice, PipelineState, RenderError, RenderTargetDescriptor,
    ResourceError, SamplerFilter, TextureFormat, TextureId,
};
use myre_graphics::{
    DrawContext, InitialiseContext, PlanError, RenderTargetInfo, RendererComponent,
    ResourceContext,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A device call, as seen by [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(TextureId),
    Destroy(TextureId),
    SetTargets(Vec<TextureId>),
    Clear,
    Resample(TextureId, TextureId),
    Composite(TextureId, Viewport, SamplerFilter),
}

#[derive(Debug, Default)]
struct State {
    next_id: usize,
    targets: HashMap<TextureId, (Extent2D, TextureFormat)>,
    bound: Vec<TextureId>,
    pipeline: PipelineState,
    calls: Vec<Call>,
    lost: bool,
}

impl State {
    fn alive(&self) -> Result<(), ResourceError> {
        if self.lost {
            Err(ResourceError::DeviceLost)
        } else {
            Ok(())
        }
    }
}

/// A device that only records what it is asked to do.
#[derive(Debug)]
pub struct RecordingDevice {
    back_buffer: Extent2D,
    state: Mutex<State>,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            back_buffer: Extent2D::new(width, height),
            state: Mutex::new(State::default()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn creates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Create(_)))
            .count()
    }

    pub fn size_of(&self, id: TextureId) -> Option<Extent2D> {
        self.state.lock().unwrap().targets.get(&id).map(|t| t.0)
    }

    /// Every following call fails with a device loss.
    pub fn lose(&self) {
        self.state.lock().unwrap().lost = true;
    }

    /// Brings the device back with no resource left.
    pub fn restore(&self) {
        let mut state = self.state.lock().unwrap();
        state.lost = false;
        state.targets.clear();
        state.bound.clear();
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let mut state = self.state.lock().unwrap();
        state.alive()?;
        state.next_id += 1;
        let id = TextureId(state.next_id);
        state
            .targets
            .insert(id, (descriptor.size, descriptor.format));
        state.calls.push(Call::Create(id));
        Ok(id)
    }

    fn destroy_render_target(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.state.lock().unwrap();
        state.alive()?;
        state.targets.remove(&id).ok_or(ResourceError::NotFound(id))?;
        state.calls.push(Call::Destroy(id));
        Ok(())
    }

    fn render_target_size(&self, id: TextureId) -> Result<Extent2D, ResourceError> {
        let state = self.state.lock().unwrap();
        state.alive()?;
        state
            .targets
            .get(&id)
            .map(|t| t.0)
            .ok_or(ResourceError::NotFound(id))
    }

    fn back_buffer_size(&self) -> Extent2D {
        self.back_buffer
    }

    fn set_render_targets(&self, targets: &[TextureId]) -> Result<(), RenderError> {
        let mut state = self.state.lock().unwrap();
        state.alive()?;
        state.bound = targets.to_vec();
        state.calls.push(Call::SetTargets(targets.to_vec()));
        Ok(())
    }

    fn render_targets(&self) -> Vec<TextureId> {
        self.state.lock().unwrap().bound.clone()
    }

    fn clear(&self, _options: ClearOptions) -> Result<(), RenderError> {
        let mut state = self.state.lock().unwrap();
        state.alive()?;
        state.calls.push(Call::Clear);
        Ok(())
    }

    fn pipeline_state(&self) -> PipelineState {
        self.state.lock().unwrap().pipeline
    }

    fn set_pipeline_state(&self, pipeline: PipelineState) {
        self.state.lock().unwrap().pipeline = pipeline;
    }

    fn resample(&self, source: TextureId, destination: TextureId) -> Result<(), RenderError> {
        let mut state = self.state.lock().unwrap();
        state.alive()?;
        state.calls.push(Call::Resample(source, destination));
        Ok(())
    }

    fn composite(
        &self,
        source: TextureId,
        viewport: Viewport,
        filter: SamplerFilter,
    ) -> Result<(), RenderError> {
        let mut state = self.state.lock().unwrap();
        state.alive()?;
        state.calls.push(Call::Composite(source, viewport, filter));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared record of what [`Stage`]s did.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<String>>>,
    targets: Arc<Mutex<HashMap<String, TextureId>>>,
}

impl Journal {
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    /// The target last published under `resource`.
    pub fn target(&self, resource: &str) -> Option<TextureId> {
        self.targets.lock().unwrap().get(resource).copied()
    }
}

type Probe = Box<dyn FnMut(&mut DrawContext<'_>) + Send>;

/// A configurable component: reads its inputs, allocates and publishes its
/// outputs, binding the left-set ones.
pub struct Stage {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<(String, RenderTargetInfo, bool)>,
    journal: Journal,
    probe: Option<Probe>,
    bind: bool,
    failures: usize,
}

impl Stage {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_owned(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            journal: journal.clone(),
            probe: None,
            bind: true,
            failures: 0,
        }
    }

    pub fn reads(mut self, name: &str) -> Self {
        self.inputs.push(name.to_owned());
        self
    }

    pub fn writes(mut self, name: &str, info: RenderTargetInfo, is_left_set: bool) -> Self {
        self.outputs.push((name.to_owned(), info, is_left_set));
        self
    }

    /// Runs before the stage reads its inputs.
    pub fn probe(mut self, probe: impl FnMut(&mut DrawContext<'_>) + Send + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Never binds its outputs.
    pub fn unbound(mut self) -> Self {
        self.bind = false;
        self
    }

    /// Fails after publishing its outputs, on every draw.
    pub fn failing(mut self) -> Self {
        self.failures = usize::MAX;
        self
    }

    /// Fails after publishing its outputs, on the first draw only.
    pub fn failing_once(mut self) -> Self {
        self.failures = 1;
        self
    }
}

impl RendererComponent for Stage {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialise(
        &mut self,
        _cx: &InitialiseContext<'_>,
        resources: &mut ResourceContext,
    ) -> Result<(), PlanError> {
        for input in &self.inputs {
            resources.define_input(input)?;
        }
        for (name, info, is_left_set) in &self.outputs {
            resources.define_output(name, *is_left_set, None, info.clone())?;
        }
        self.journal.push(format!("initialise:{}", self.name));
        Ok(())
    }

    fn draw(&mut self, cx: &mut DrawContext<'_>) -> Result<(), RenderError> {
        self.journal.push(format!("draw:{}", self.name));
        if let Some(probe) = self.probe.as_mut() {
            probe(cx);
        }
        for input in &self.inputs {
            cx.resource(input)?;
        }

        let mut bound = Vec::new();
        for (name, info, is_left_set) in &self.outputs {
            let target = cx.get_target(info)?;
            if *is_left_set {
                bound.push(target);
            }
            cx.output(name, target)?;
            self.journal
                .targets
                .lock()
                .unwrap()
                .insert(name.clone(), target);
        }
        if self.bind && !bound.is_empty() {
            cx.device.set_render_targets(&bound)?;
        }

        if self.failures > 0 {
            self.failures -= 1;
            return Err(RenderError::RenderingFailed(format!("{} failed", self.name)));
        }
        Ok(())
    }

    fn dispose(&mut self, _device: &dyn GraphicsDevice) {
        self.journal.push(format!("dispose:{}", self.name));
    }
}

pub fn colour(width: u32, height: u32) -> RenderTargetInfo {
    RenderTargetInfo::new(width, height, TextureFormat::Rgba8Unorm)
}
