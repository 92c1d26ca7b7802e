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

//! Material planning and texture decoding.
//!
//! Planning is pure CPU work on the description: colored materials become
//! texels of one atlas, textured materials become indices into a list of
//! unique texture files. Slots are assigned later, once the bindless ranges
//! are known, by rebasing those indices.

mod plan;
mod texture;

pub use self::plan::{MaterialPlan, PlannedMaterial, ATLAS_MAX_WIDTH, TEXELS_PER_MATERIAL};
pub use self::texture::{decode_image, load_texture, DecodedImage};
