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

//! The error taxonomy of the scene pipeline.
//!
//! Three independent subsystems can fail while a scene is being built: the GPU
//! ([`ResourceError`]), asset import ([`ImportError`]) and the scene itself
//! ([`SceneError`]). At the pipeline boundary they are folded into the closed
//! union [`ProgramError`]; the `From` impls below are the only conversion path,
//! so `?` does the right thing in every build task.

use crate::memory::StagingError;
use crate::renderer::error::ResourceError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The kinds of named entries a scene contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A procedural geometry.
    ProceduralGeometry,
    /// An imported (glTF) geometry.
    ImportedGeometry,
    /// A material.
    Material,
    /// A drawable entity.
    Entity,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::ProceduralGeometry => write!(f, "procedural geometry"),
            EntryKind::ImportedGeometry => write!(f, "imported geometry"),
            EntryKind::Material => write!(f, "material"),
            EntryKind::Entity => write!(f, "entity"),
        }
    }
}

/// An error raised while importing an external asset.
#[derive(Debug)]
pub enum ImportError {
    /// The asset or one of its dependencies could not be read.
    Io {
        /// Path of the file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The glTF document is malformed or references missing data.
    Gltf {
        /// Path of the document.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
    /// An image could not be decoded.
    Image {
        /// Path of the image, or of the document embedding it.
        path: PathBuf,
        /// The decoder's message.
        message: String,
    },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io { path, source } => {
                write!(f, "Failed to read '{}': {source}", path.display())
            }
            ImportError::Gltf { path, message } => {
                write!(f, "Invalid glTF '{}': {message}", path.display())
            }
            ImportError::Image { path, message } => {
                write!(f, "Failed to decode image '{}': {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// An error in the scene description or in assembling it.
#[derive(Debug)]
pub enum SceneError {
    /// The description file could not be read.
    Io {
        /// Path of the description.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The description does not parse.
    Parse {
        /// The parser's message.
        message: String,
    },
    /// An entity names a geometry that does not exist.
    UnresolvedGeometry {
        /// The offending entity.
        entity: String,
        /// The missing geometry name.
        reference: String,
    },
    /// An entity names a material that does not exist.
    UnresolvedMaterial {
        /// The offending entity.
        entity: String,
        /// The missing material name.
        reference: String,
    },
    /// Two entries of the same kind share a name.
    DuplicateName {
        /// The kind of entry.
        kind: EntryKind,
        /// The repeated name.
        name: String,
    },
    /// Two distinct names of the same kind hash to the same key.
    HashCollision {
        /// The kind of entry.
        kind: EntryKind,
        /// The name seen first.
        first: String,
        /// The name that collided with it.
        second: String,
        /// The shared key.
        hash: u32,
    },
    /// Procedural generation parameters are out of range.
    InvalidGeometry {
        /// The geometry name.
        name: String,
        /// Which parameter is wrong.
        reason: String,
    },
    /// An internal consistency check failed.
    InvariantViolation(String),
    /// The renderer promise was dropped without ever being resolved.
    RendererUnavailable,
    /// The renderer did not become ready within the startup deadline.
    StartupDeadline {
        /// The deadline that elapsed.
        deadline: Duration,
    },
    /// The task observed a cancellation request.
    Cancelled,
    /// A build task panicked or was aborted.
    TaskFailed(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Io { path, source } => {
                write!(f, "Failed to read scene '{}': {source}", path.display())
            }
            SceneError::Parse { message } => write!(f, "Failed to parse scene: {message}"),
            SceneError::UnresolvedGeometry { entity, reference } => write!(
                f,
                "Entity '{entity}' references unknown geometry '{reference}'"
            ),
            SceneError::UnresolvedMaterial { entity, reference } => write!(
                f,
                "Entity '{entity}' references unknown material '{reference}'"
            ),
            SceneError::DuplicateName { kind, name } => {
                write!(f, "Duplicate {kind} name '{name}'")
            }
            SceneError::HashCollision {
                kind,
                first,
                second,
                hash,
            } => write!(
                f,
                "{kind} names '{first}' and '{second}' collide on hash {hash:#010x}"
            ),
            SceneError::InvalidGeometry { name, reason } => {
                write!(f, "Invalid parameters for geometry '{name}': {reason}")
            }
            SceneError::InvariantViolation(msg) => write!(f, "Invariant violated: {msg}"),
            SceneError::RendererUnavailable => {
                write!(f, "The renderer was dropped before it became ready")
            }
            SceneError::StartupDeadline { deadline } => write!(
                f,
                "The renderer did not become ready within {} ms",
                deadline.as_millis()
            ),
            SceneError::Cancelled => write!(f, "Scene construction was cancelled"),
            SceneError::TaskFailed(msg) => write!(f, "A build task failed: {msg}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The closed union of everything that can abort scene construction.
#[derive(Debug)]
pub enum ProgramError {
    /// A GPU resource could not be created, staged or submitted.
    Resource(ResourceError),
    /// An external asset could not be imported.
    Import(ImportError),
    /// The scene is invalid or could not be assembled.
    Scene(SceneError),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::Resource(err) => write!(f, "GPU resource error: {err}"),
            ProgramError::Import(err) => write!(f, "Import error: {err}"),
            ProgramError::Scene(err) => write!(f, "Scene error: {err}"),
        }
    }
}

impl std::error::Error for ProgramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProgramError::Resource(err) => Some(err),
            ProgramError::Import(err) => Some(err),
            ProgramError::Scene(err) => Some(err),
        }
    }
}

impl From<ResourceError> for ProgramError {
    fn from(err: ResourceError) -> Self {
        ProgramError::Resource(err)
    }
}

impl From<StagingError> for ProgramError {
    fn from(err: StagingError) -> Self {
        ProgramError::Resource(ResourceError::Staging(err))
    }
}

impl From<ImportError> for ProgramError {
    fn from(err: ImportError) -> Self {
        ProgramError::Import(err)
    }
}

impl From<SceneError> for ProgramError {
    fn from(err: SceneError) -> Self {
        ProgramError::Scene(err)
    }
}

impl ProgramError {
    /// Returns the scene error, if this is one.
    pub fn as_scene(&self) -> Option<&SceneError> {
        match self {
            ProgramError::Scene(err) => Some(err),
            _ => None,
        }
    }
}
