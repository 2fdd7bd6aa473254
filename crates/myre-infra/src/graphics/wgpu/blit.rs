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

//! Full-screen texture copies, used by both resampling and compositing.

use myre_core::renderer::SamplerFilter;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

// Filtering is done by hand with `textureLoad` so float formats that are not
// filterable on the adapter can still be blitted.
const BLIT_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var source: texture_2d<f32>;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

fn texel(coord: vec2<i32>) -> vec4<f32> {
    let limit = vec2<i32>(textureDimensions(source)) - vec2<i32>(1);
    return textureLoad(source, clamp(coord, vec2<i32>(0), limit), 0);
}

@fragment
fn fs_point(in: VertexOutput) -> @location(0) vec4<f32> {
    let size = vec2<f32>(textureDimensions(source));
    return texel(vec2<i32>(floor(in.uv * size)));
}

@fragment
fn fs_linear(in: VertexOutput) -> @location(0) vec4<f32> {
    let size = vec2<f32>(textureDimensions(source));
    let position = in.uv * size - vec2<f32>(0.5);
    let base = vec2<i32>(floor(position));
    let t = fract(position);
    let top = mix(texel(base), texel(base + vec2<i32>(1, 0)), t.x);
    let bottom = mix(texel(base + vec2<i32>(0, 1)), texel(base + vec2<i32>(1, 1)), t.x);
    return mix(top, bottom, t.y);
}
"#;

/// Identifies one blit pipeline variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct BlitKey {
    pub format: wgpu::TextureFormat,
    pub filter: SamplerFilter,
    pub sample_count: u32,
}

/// A single blit, recorded into a caller-provided encoder.
pub(super) struct BlitPass<'a> {
    pub source: &'a wgpu::TextureView,
    pub destination: &'a wgpu::TextureView,
    pub key: BlitKey,
    pub load: wgpu::LoadOp<wgpu::Color>,
    /// `[x, y, width, height]` in destination pixels. `None` covers everything.
    pub viewport: Option<[f32; 4]>,
}

/// Owns the blit shader and lazily builds one pipeline per [`BlitKey`].
#[derive(Debug)]
pub(super) struct Blitter {
    shader: wgpu::ShaderModule,
    pipelines: Mutex<HashMap<BlitKey, wgpu::RenderPipeline>>,
}

impl Blitter {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("myre_blit_shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER.into()),
        });
        Self {
            shader,
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    /// Number of pipeline variants built so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn record(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        blit: BlitPass<'_>,
    ) {
        let mut pipelines = self.pipelines.lock().unwrap_or_else(PoisonError::into_inner);
        let pipeline = pipelines.entry(blit.key).or_insert_with(|| {
            log::debug!("Creating blit pipeline for {:?}", blit.key);
            self.create_pipeline(device, blit.key)
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("myre_blit_bind_group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(blit.source),
            }],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("myre_blit_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: blit.destination,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: blit.load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        if let Some([x, y, width, height]) = blit.viewport {
            pass.set_viewport(x, y, width, height, 0.0, 1.0);
        }
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn create_pipeline(&self, device: &wgpu::Device, key: BlitKey) -> wgpu::RenderPipeline {
        let fragment_entry = match key.filter {
            SamplerFilter::Linear => "fs_linear",
            SamplerFilter::Point => "fs_point",
        };
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("myre_blit_pipeline"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some(fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: key.sample_count,
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        })
    }
}
