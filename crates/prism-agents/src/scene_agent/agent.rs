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

//! The top-level orchestration of scene construction.

use super::config::AssemblerConfig;
use super::imported::build_imported;
use super::materials::build_materials;
use super::procedural::{self, build_procedural};
use super::stage::{task_failed, BuiltResource, TaskContext, TaskKind};
use prism_core::renderer::{GraphicsDevice, WaitToken};
use prism_core::task::{CancellationToken, SharedRendererHandle};
use prism_core::{EntryKind, HashedName, ProgramError, SceneError};
use prism_data::scene::{
    EntityDrawable, GeometryRef, GltfEntityDescription, MaterialDescription, MaterialRef,
    NameIndex, ProceduralEntityDescription, SceneDefinition, SceneDescription, SceneLights,
};
use std::path::Path;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Name indices of every entry kind in a description.
struct SceneNames {
    procedural: NameIndex,
    imported: NameIndex,
    materials: NameIndex,
}

impl SceneNames {
    fn index(description: &SceneDescription) -> Result<Self, SceneError> {
        let procedural = NameIndex::build(
            EntryKind::ProceduralGeometry,
            description.procedural_geometries.iter().map(|g| g.name.as_str()),
        )?;
        let imported = NameIndex::build(
            EntryKind::ImportedGeometry,
            description.gltf_geometries.iter().map(|g| g.name.as_str()),
        )?;
        let materials = NameIndex::build(
            EntryKind::Material,
            description.materials.iter().map(MaterialDescription::name),
        )?;
        // Entity names only need to be unique; nothing references them.
        NameIndex::build(
            EntryKind::Entity,
            description
                .procedural_entities
                .iter()
                .map(|e| e.name.as_str())
                .chain(description.gltf_entities.iter().map(|e| e.name.as_str())),
        )?;
        Ok(Self {
            procedural,
            imported,
            materials,
        })
    }
}

/// Position of each material inside the storage buffer of its kind.
fn material_refs(materials: &[MaterialDescription]) -> Vec<MaterialRef> {
    let mut colored = 0u32;
    let mut textured = 0u32;
    materials
        .iter()
        .map(|material| match material {
            MaterialDescription::Colored { .. } => {
                colored += 1;
                MaterialRef::Colored(colored - 1)
            }
            MaterialDescription::Textured { .. } => {
                textured += 1;
                MaterialRef::Textured(textured - 1)
            }
        })
        .collect()
}

fn resolve_entities(
    names: &SceneNames,
    material_refs: &[MaterialRef],
    procedural_entities: Vec<ProceduralEntityDescription>,
    gltf_entities: Vec<GltfEntityDescription>,
) -> Result<Vec<EntityDrawable>, SceneError> {
    let mut entities = Vec::with_capacity(procedural_entities.len() + gltf_entities.len());

    for entity in procedural_entities {
        let geometry = names.procedural.resolve(&entity.geometry).ok_or_else(|| {
            SceneError::UnresolvedGeometry {
                entity: entity.name.clone(),
                reference: entity.geometry.clone(),
            }
        })?;
        let material = names
            .materials
            .resolve(&entity.material)
            .map(|index| material_refs[index])
            .ok_or_else(|| SceneError::UnresolvedMaterial {
                entity: entity.name.clone(),
                reference: entity.material.clone(),
            })?;
        entities.push(EntityDrawable {
            hashed_name: HashedName::of(&entity.name),
            name: entity.name,
            geometry: GeometryRef::Procedural(geometry),
            material: Some(material),
            orientation: entity.orientation.unwrap_or_default(),
        });
    }

    for entity in gltf_entities {
        let geometry = names.imported.resolve(&entity.gltf).ok_or_else(|| {
            SceneError::UnresolvedGeometry {
                entity: entity.name.clone(),
                reference: entity.gltf.clone(),
            }
        })?;
        entities.push(EntityDrawable {
            hashed_name: HashedName::of(&entity.name),
            name: entity.name,
            geometry: GeometryRef::Imported(geometry),
            material: None,
            orientation: entity.orientation.unwrap_or_default(),
        });
    }

    Ok(entities)
}

/// Awaits one build task; any failure cancels its siblings.
async fn join<T>(
    task: JoinHandle<Result<BuiltResource<T>, ProgramError>>,
    cancel: &CancellationToken,
) -> Result<BuiltResource<T>, ProgramError> {
    let result = match task.await {
        Ok(result) => result,
        Err(e) => Err(task_failed(e).into()),
    };
    if result.is_err() {
        cancel.cancel();
    }
    result
}

/// Builds a [`SceneDefinition`] from a [`SceneDescription`].
///
/// Build tasks are spawned on `pool` and may start long before the renderer
/// exists; they rendezvous with it through the shared handle.
pub struct SceneAssembler {
    pool: Handle,
    renderer: SharedRendererHandle<dyn GraphicsDevice>,
    config: AssemblerConfig,
}

impl SceneAssembler {
    /// Creates an assembler spawning its tasks on `pool`.
    pub fn new(
        pool: Handle,
        renderer: SharedRendererHandle<dyn GraphicsDevice>,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            pool,
            renderer,
            config,
        }
    }

    /// The assembler settings.
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Parses the description at `path`, then assembles it.
    ///
    /// A description that does not parse fails before any task is spawned.
    pub async fn assemble_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<SceneDefinition, ProgramError> {
        let description = SceneDescription::load(path)?;
        self.assemble(description).await
    }

    /// Assembles `description`.
    ///
    /// The first error in await order (procedural, imported, materials) is
    /// returned; an unresolved entity reference wins over any task error.
    /// No partial scene is ever returned.
    pub async fn assemble(
        &self,
        description: SceneDescription,
    ) -> Result<SceneDefinition, ProgramError> {
        let names = SceneNames::index(&description)?;
        let material_refs = material_refs(&description.materials);

        let SceneDescription {
            materials,
            gltf_geometries,
            procedural_geometries,
            directional_lights,
            point_lights,
            spot_lights,
            procedural_entities,
            gltf_entities,
        } = description;

        let cancel = CancellationToken::new();
        let context = |kind| {
            TaskContext::new(
                kind,
                self.renderer.clone(),
                self.config.startup_deadline,
                cancel.clone(),
            )
        };

        log::info!(
            "SceneAssembler: building {} procedural, {} imported geometries and {} materials",
            procedural_geometries.len(),
            gltf_geometries.len(),
            materials.len()
        );

        let materials_task = self.pool.spawn(build_materials(
            context(TaskKind::Materials),
            materials,
            self.config.asset_root.clone(),
        ));
        let imported_task = self.pool.spawn(build_imported(
            context(TaskKind::Imported),
            gltf_geometries,
            self.config.asset_root.clone(),
            self.config.importer.clone(),
        ));

        let layout = match procedural::layout(&procedural_geometries) {
            Ok(layout) => layout,
            Err(e) => {
                cancel.cancel();
                return Err(e.into());
            }
        };
        let procedural_task = self.pool.spawn(build_procedural(
            context(TaskKind::Procedural),
            procedural_geometries,
            layout,
        ));

        let entities = match resolve_entities(
            &names,
            &material_refs,
            procedural_entities,
            gltf_entities,
        ) {
            Ok(entities) => entities,
            Err(e) => {
                cancel.cancel();
                return Err(e.into());
            }
        };

        let procedural = join(procedural_task, &cancel).await?;
        let imported = join(imported_task, &cancel).await?;
        let materials = join(materials_task, &cancel).await?;

        let uploads: Vec<WaitToken> = procedural
            .uploads
            .into_iter()
            .chain(imported.uploads)
            .chain(materials.uploads)
            .collect();
        let submissions = uploads.len();
        self.pool
            .spawn_blocking(move || uploads.iter().try_for_each(WaitToken::wait))
            .await
            .map_err(task_failed)??;

        // Every copy out of the staging buffer has completed.
        if let Some(device) = self.renderer.try_get() {
            device.staging().reset();
        }

        let scene = SceneDefinition {
            procedural: procedural.resource,
            imported: imported.resource,
            materials: materials.resource,
            entities,
            lights: SceneLights {
                directional: directional_lights,
                point: point_lights,
                spot: spot_lights,
            },
        };
        log::info!(
            "SceneAssembler: scene ready with {} geometries, {} entities, {} materials ({} submissions)",
            scene.geometry_count(),
            scene.entities.len(),
            scene.materials.entries.len(),
            submissions
        );
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
(
    materials: [
        colored(
            name: "red",
            ambient: (0.1, 0.0, 0.0, 1.0),
            diffuse: (0.8, 0.0, 0.0, 1.0),
            specular: (1.0, 1.0, 1.0, 1.0),
        ),
        textured(name: "bricks", ambient: "a.png", diffuse: "b.png", specular: "a.png"),
        colored(
            name: "blue",
            ambient: (0.0, 0.0, 0.1, 1.0),
            diffuse: (0.0, 0.0, 0.8, 1.0),
            specular: (1.0, 1.0, 1.0, 1.0),
        ),
    ],
    gltf_geometries: [(name: "helmet", path: "helmet.gltf")],
    procedural_geometries: [
        (name: "floor", params: grid(cells_x: 2, cells_z: 2, width: 1.0, depth: 1.0)),
    ],
    procedural_entities: [
        (name: "floor0", material: "blue", geometry: "floor"),
    ],
    gltf_entities: [
        (name: "helmet0", gltf: "helmet"),
    ],
)
"#;

    fn scene() -> SceneDescription {
        SceneDescription::from_ron_str(SCENE).unwrap()
    }

    fn resolve(description: SceneDescription) -> Result<Vec<EntityDrawable>, SceneError> {
        let names = SceneNames::index(&description)?;
        let refs = material_refs(&description.materials);
        resolve_entities(
            &names,
            &refs,
            description.procedural_entities,
            description.gltf_entities,
        )
    }

    #[test]
    fn material_refs_count_per_kind() {
        assert_eq!(
            material_refs(&scene().materials),
            vec![
                MaterialRef::Colored(0),
                MaterialRef::Textured(0),
                MaterialRef::Colored(1)
            ]
        );
    }

    #[test]
    fn entities_resolve_in_description_order() {
        let entities = resolve(scene()).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].geometry, GeometryRef::Procedural(0));
        assert_eq!(entities[0].material, Some(MaterialRef::Colored(1)));
        assert_eq!(entities[0].hashed_name, HashedName::of("floor0"));
        assert_eq!(entities[1].geometry, GeometryRef::Imported(0));
        assert_eq!(entities[1].material, None);
    }

    #[test]
    fn unresolved_gltf_names_the_entity() {
        let mut description = scene();
        description.gltf_entities[0].gltf = "lantern".to_string();
        match resolve(description).unwrap_err() {
            SceneError::UnresolvedGeometry { entity, reference } => {
                assert_eq!(entity, "helmet0");
                assert_eq!(reference, "lantern");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn entity_names_are_unique_across_both_lists() {
        let mut description = scene();
        description.gltf_entities[0].name = "floor0".to_string();
        assert!(matches!(
            SceneNames::index(&description),
            Err(SceneError::DuplicateName {
                kind: EntryKind::Entity,
                ..
            })
        ));
    }
}
