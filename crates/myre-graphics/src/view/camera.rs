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

use glam::{Mat4, Vec3};
use myre_core::math::Viewport;
use myre_core::metadata::names;
use myre_core::RendererMetadata;

/// Defines the type of camera projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection with field of view.
    Perspective {
        /// The vertical field of view in radians.
        fov_y_radians: f32,
    },
    /// Orthographic projection with view bounds.
    Orthographic {
        /// The width of the orthographic view volume.
        width: f32,
        /// The height of the orthographic view volume.
        height: f32,
    },
}

/// The camera a view renders from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World to view transform.
    pub view: Mat4,
    /// The type of projection.
    pub projection: Projection,
    /// The distance to the near clipping plane.
    pub near_clip: f32,
    /// The distance to the far clipping plane.
    pub far_clip: f32,
}

impl Camera {
    /// Creates a perspective camera at the origin.
    pub fn new_perspective(fov_y_radians: f32, near_clip: f32, far_clip: f32) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Projection::Perspective { fov_y_radians },
            near_clip,
            far_clip,
        }
    }

    /// Creates an orthographic camera at the origin.
    pub fn new_orthographic(width: f32, height: f32, near_clip: f32, far_clip: f32) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Projection::Orthographic { width, height },
            near_clip,
            far_clip,
        }
    }

    /// Points the camera from `eye` at `target`.
    pub fn look_at(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.view = Mat4::look_at_rh(eye, target, up);
        self
    }

    /// Calculates the projection matrix for a given aspect ratio.
    ///
    /// This uses a right-handed coordinate system with a [0, 1] depth range.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y_radians } => {
                Mat4::perspective_rh(fov_y_radians, aspect_ratio, self.near_clip, self.far_clip)
            }
            Projection::Orthographic { width, height } => {
                let half_width = width / 2.0;
                let half_height = height / 2.0;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near_clip,
                    self.far_clip,
                )
            }
        }
    }

    /// Writes the camera metadata of a view rendered into `viewport`:
    /// `resolution`, `view`, `projection`, `viewprojection`, their inverses,
    /// `nearclip` and `farclip`.
    pub fn write_metadata(&self, metadata: &mut RendererMetadata, viewport: Viewport) {
        let projection = self.projection_matrix(viewport.aspect_ratio());

        metadata.write(names::RESOLUTION, viewport.extent().as_vec2());
        metadata.write(names::VIEW, self.view);
        metadata.write(names::PROJECTION, projection);
        metadata.write(names::VIEW_PROJECTION, projection * self.view);
        metadata.write(names::INVERSE_VIEW, self.view.inverse());
        metadata.write(names::INVERSE_PROJECTION, projection.inverse());
        metadata.write(names::NEAR_CLIP, self.near_clip);
        metadata.write(names::FAR_CLIP, self.far_clip);
    }
}

impl Default for Camera {
    /// A 60 degree perspective camera with clip planes at 0.1 and 1000.
    fn default() -> Self {
        Self::new_perspective(60.0_f32.to_radians(), 0.1, 1000.0)
    }
}
