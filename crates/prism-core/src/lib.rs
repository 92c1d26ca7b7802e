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

//! # Prism Core
//!
//! Foundational crate containing the error taxonomy, the GPU capability
//! contracts consumed by the scene pipeline, staging memory and the task
//! execution contexts every build task runs on.

#![warn(missing_docs)]

pub mod error;
pub mod hash;
pub mod macros;
pub mod memory;
pub mod renderer;
pub mod task;

pub use error::{EntryKind, ImportError, ProgramError, SceneError};
pub use hash::HashedName;
