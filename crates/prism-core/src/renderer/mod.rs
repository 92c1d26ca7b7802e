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

//! Provides the backend-agnostic GPU capability surface consumed by the scene pipeline.
//!
//! This module defines the "common language" between the resource build tasks
//! and whatever renderer ends up owning the device. It contains the abstract
//! [`GraphicsDevice`] trait, the descriptor and command types passed through it,
//! and the [`ResourceError`] hierarchy.
//!
//! The 'how' lives in `prism-infra`, which implements [`GraphicsDevice`] for a
//! wgpu device and for a host-memory device. `prism-lanes` and `prism-agents`
//! only ever see the trait.

pub mod api;
pub mod error;
pub mod resource;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::ResourceError;
pub use self::resource::{OwnedBuffer, OwnedTexture};
pub use self::traits::{GraphicsDevice, SubmissionFence};
