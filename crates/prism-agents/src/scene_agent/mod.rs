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

//! The scene agent turns a [`SceneDescription`](prism_data::scene::SceneDescription)
//! into a [`SceneDefinition`](prism_data::scene::SceneDefinition).
//!
//! Three build tasks run concurrently on the pool:
//! - procedural geometry, laid out synchronously and synthesized on the pool;
//! - imported (glTF) geometry with its materials and images;
//! - scene materials, split into a colour atlas and deduplicated textures.
//!
//! Each task does its CPU work first, then suspends once on the shared
//! renderer handle before creating and filling GPU objects. The
//! [`SceneAssembler`] fans the tasks out, resolves entity references and
//! merges the outputs.

mod agent;
mod config;
mod imported;
mod materials;
mod procedural;
mod stage;

pub use self::agent::SceneAssembler;
pub use self::config::{AssemblerConfig, DEFAULT_STARTUP_DEADLINE};
pub use self::imported::build_imported;
pub use self::materials::build_materials;
pub use self::procedural::build_procedural;
pub use self::stage::{BuildStage, BuiltResource, TaskContext, TaskKind};
