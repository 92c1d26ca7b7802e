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

//! # Prism Lanes
//!
//! The hot-path pieces the build tasks are made of. Each lane does one job
//! and knows nothing about scheduling:
//!
//! - [`geometry_lane`]: procedural shape synthesis and glTF import.
//! - [`material_lane`]: splitting material descriptions into a colour atlas
//!   and a deduplicated texture list, and decoding those textures.
//! - [`transfer_lane`]: packing payloads into staging memory and submitting
//!   the copies.

#![warn(missing_docs)]

pub mod geometry_lane;
pub mod material_lane;
pub mod transfer_lane;
