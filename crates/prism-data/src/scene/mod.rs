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

//! Scene description (input), scene definition (output) and the helpers that
//! connect them.

pub mod definition;
pub mod description;
pub mod layout;
pub mod light;
pub mod names;

pub use self::definition::{
    ColoredMaterial, DrawIndirectTemplate, EntityDrawable, GeometryEntry, GeometryRef,
    ImportedGeometry, ImportedGeometryEntry, MaterialEntry, MaterialRef, MaterialTables,
    ProceduralGeometry, SceneDefinition, SceneLights, TexturedMaterial,
};
pub use self::description::{
    GeometryParams, GltfEntityDescription, GltfGeometryDescription, MaterialDescription,
    Orientation, ProceduralEntityDescription, ProceduralGeometryDescription, SceneDescription,
};
pub use self::layout::{GeometryCounts, GeometryLayout, OffsetAccumulator, MAX_VERTICES};
pub use self::light::{DirectionalLight, PointLight, SpotLight};
pub use self::names::NameIndex;
