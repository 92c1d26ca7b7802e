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

//! Light sources. Parsed from the description and carried unchanged into the
//! scene definition.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A light infinitely far away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels in.
    pub direction: Vec3,
    /// Ambient contribution.
    pub ambient: Vec4,
    /// Diffuse contribution.
    pub diffuse: Vec4,
    /// Specular contribution.
    pub specular: Vec4,
}

/// An omnidirectional light with distance attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// World-space position.
    pub position: Vec3,
    /// Distance past which the light has no effect.
    pub range: f32,
    /// Constant, linear and quadratic attenuation terms.
    pub attenuation: Vec3,
    /// Ambient contribution.
    pub ambient: Vec4,
    /// Diffuse contribution.
    pub diffuse: Vec4,
    /// Specular contribution.
    pub specular: Vec4,
}

/// A cone of light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    /// World-space position.
    pub position: Vec3,
    /// Axis of the cone.
    pub direction: Vec3,
    /// Distance past which the light has no effect.
    pub range: f32,
    /// Constant, linear and quadratic attenuation terms.
    pub attenuation: Vec3,
    /// Inner cone half-angle, in degrees.
    pub inner_cutoff: f32,
    /// Outer cone half-angle, in degrees.
    pub outer_cutoff: f32,
    /// Ambient contribution.
    pub ambient: Vec4,
    /// Diffuse contribution.
    pub diffuse: Vec4,
    /// Specular contribution.
    pub specular: Vec4,
}
