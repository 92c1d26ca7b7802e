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

//! Defines the error type for GPU resource creation, staging and submission.

use crate::memory::StagingError;
use crate::renderer::api::bindless::BindlessKind;
use crate::renderer::api::command::QueueKind;
use std::fmt;

/// An error related to the creation or use of a GPU resource (buffers, textures, jobs).
#[derive(Debug)]
pub enum ResourceError {
    /// A resource could not be found for the given ID.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds.
    OutOfBounds,
    /// The staging allocator refused a request.
    Staging(StagingError),
    /// Every command buffer of the pool is in flight.
    CommandPoolExhausted {
        /// Size of the pool.
        capacity: usize,
    },
    /// A bindless descriptor table has no room for the requested slots.
    BindlessSlotsExhausted {
        /// The table that ran out.
        kind: BindlessKind,
        /// Slots requested.
        requested: u32,
        /// Slots still free.
        available: u32,
    },
    /// A job was submitted on a different queue than it was recorded for.
    QueueMismatch {
        /// The queue the job was created for.
        recorded: QueueKind,
        /// The queue it was submitted to.
        submitted: QueueKind,
    },
    /// The device was lost while a submission was pending.
    DeviceLost,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::Staging(err) => write!(f, "Staging error: {err}"),
            ResourceError::CommandPoolExhausted { capacity } => {
                write!(f, "Command pool exhausted: all {capacity} jobs in flight")
            }
            ResourceError::BindlessSlotsExhausted {
                kind,
                requested,
                available,
            } => write!(
                f,
                "Bindless {kind} slots exhausted: requested {requested}, {available} available"
            ),
            ResourceError::QueueMismatch {
                recorded,
                submitted,
            } => write!(
                f,
                "Job recorded for the {recorded} queue was submitted to the {submitted} queue"
            ),
            ResourceError::DeviceLost => write!(f, "The graphics device was lost."),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Staging(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StagingError> for ResourceError {
    fn from(err: StagingError) -> Self {
        ResourceError::Staging(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn staging_error_is_wrapped_with_source() {
        let err: ResourceError = StagingError::OutOfStagingSpace {
            requested: 128,
            available: 64,
            capacity: 1024,
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "Staging error: Out of staging space: requested 128 bytes, 64 of 1024 available"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn pool_and_slot_errors_display() {
        let err = ResourceError::CommandPoolExhausted { capacity: 4 };
        assert_eq!(format!("{err}"), "Command pool exhausted: all 4 jobs in flight");

        let err = ResourceError::BindlessSlotsExhausted {
            kind: BindlessKind::Image,
            requested: 3,
            available: 1,
        };
        assert_eq!(
            format!("{err}"),
            "Bindless image slots exhausted: requested 3, 1 available"
        );
        assert!(err.source().is_none());
    }
}
