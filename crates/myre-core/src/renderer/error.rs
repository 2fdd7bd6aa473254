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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::metadata::MetadataError;
use crate::renderer::api::TextureId;
use std::fmt;

/// An error related to the creation or use of a GPU resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The referenced resource does not exist on the device.
    NotFound(TextureId),
    /// The handle or ID used to reference a resource is invalid for this operation.
    InvalidHandle,
    /// The requested format or shape is not supported by the device.
    UnsupportedFormat(String),
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// The device was lost; every handle it issued is invalid.
    DeviceLost,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound(id) => write!(f, "Resource not found: {id}"),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {msg}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::DeviceLost => write!(f, "The graphics device was lost."),
        }
    }
}

impl std::error::Error for ResourceError {}

/// A high-level error that can occur while a frame is being rendered.
#[derive(Debug)]
pub enum RenderError {
    /// An operation was attempted before the renderer was set up for it.
    NotInitialized,
    /// A critical rendering operation failed.
    RenderingFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// A metadata entry a component depends on was missing or mistyped.
    Metadata(MetadataError),
    /// The render plan is misconfigured. Produced by plan validation and never
    /// recoverable at run time.
    Configuration(Box<dyn std::error::Error + Send + Sync>),
    /// The graphics device was lost (e.g. GPU driver crashed or was updated).
    DeviceLost,
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl RenderError {
    /// Returns `true` if this error means the device was lost, directly or
    /// through a failed resource operation.
    pub fn is_device_lost(&self) -> bool {
        matches!(
            self,
            RenderError::DeviceLost | RenderError::ResourceError(ResourceError::DeviceLost)
        )
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotInitialized => {
                write!(f, "The renderer is not initialized.")
            }
            RenderError::RenderingFailed(msg) => {
                write!(f, "A critical rendering operation failed: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Metadata(err) => write!(f, "Renderer metadata error: {err}"),
            RenderError::Configuration(err) => {
                write!(f, "Render plan configuration error: {err}")
            }
            RenderError::DeviceLost => write!(
                f,
                "The graphics device was lost and needs to be reinitialized."
            ),
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            RenderError::Metadata(err) => Some(err),
            RenderError::Configuration(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<MetadataError> for RenderError {
    fn from(err: MetadataError) -> Self {
        RenderError::Metadata(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn resource_error_display() {
        assert_eq!(
            format!("{}", ResourceError::NotFound(TextureId(7))),
            "Resource not found: texture#7"
        );
        assert_eq!(
            format!("{}", ResourceError::DeviceLost),
            "The graphics device was lost."
        );
    }

    #[test]
    fn render_error_display_wrapping_resource_error() {
        let render_err: RenderError = ResourceError::InvalidHandle.into();
        assert_eq!(
            format!("{render_err}"),
            "Graphics resource operation failed: Invalid resource handle or ID."
        );
        assert!(render_err.source().is_some());
    }

    #[test]
    fn device_lost_is_detected_through_resource_errors() {
        assert!(RenderError::DeviceLost.is_device_lost());
        assert!(RenderError::from(ResourceError::DeviceLost).is_device_lost());
        assert!(!RenderError::NotInitialized.is_device_lost());
    }
}
