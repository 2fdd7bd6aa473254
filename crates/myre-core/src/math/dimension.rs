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

//! Pixel-space sizes and rectangles.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A two-dimensional extent, typically representing width and height.
///
/// This is used for render-target dimensions and back-buffer sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the extent as a floating point vector, the form stored in
    /// the `resolution` metadata entry.
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Builds an extent from a floating point resolution, truncating towards zero.
    pub fn from_vec2(resolution: Vec2) -> Self {
        Self {
            width: resolution.x.max(0.0) as u32,
            height: resolution.y.max(0.0) as u32,
        }
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A rectangular region of the back buffer a view is composited into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Left edge, in pixels.
    pub x: u32,
    /// Top edge, in pixels.
    pub y: u32,
    /// Width, in pixels.
    pub width: u32,
    /// Height, in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a new viewport.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A viewport covering the whole of a surface of the given size.
    pub const fn full(size: Extent2D) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// The size of the viewport.
    pub const fn extent(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }

    /// Width divided by height, or `1.0` for a degenerate viewport.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_vec2_conversion() {
        let extent = Extent2D::new(1024, 768);
        assert_eq!(extent.as_vec2(), Vec2::new(1024.0, 768.0));
        assert_eq!(Extent2D::from_vec2(extent.as_vec2()), extent);
        assert_eq!(Extent2D::from_vec2(Vec2::new(-3.0, 2.9)), Extent2D::new(0, 2));
    }

    #[test]
    fn viewport_helpers() {
        let viewport = Viewport::full(Extent2D::new(800, 400));
        assert_eq!(viewport.extent(), Extent2D::new(800, 400));
        assert_eq!(viewport.aspect_ratio(), 2.0);
        assert_eq!(Viewport::default().aspect_ratio(), 1.0);
    }
}
