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

//! Loads a scene description, brings up a device and assembles the scene.

mod config;
mod device;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Backend, RuntimeConfig};
use prism_agents::scene_agent::{AssemblerConfig, SceneAssembler};
use prism_core::renderer::GraphicsDevice;
use prism_core::task::{renderer_promise, TaskSystem};
use prism_data::scene::{SceneDefinition, SceneDescription};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Builds a scene description into GPU resources.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Scene description (RON).
    #[arg(required_unless_present = "write_sample")]
    scene: Option<PathBuf>,

    /// Runtime configuration (RON).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides the configured device backend.
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Writes the built-in sample scene to PATH.
    #[arg(long, value_name = "PATH")]
    write_sample: Option<PathBuf>,
}

fn write_sample(path: &Path) -> Result<()> {
    let text = SceneDescription::sample().to_ron_string()?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("Runtime: sample scene written to {}", path.display());
    Ok(())
}

fn report(scene: &SceneDefinition) {
    let vertices: u32 = scene
        .procedural
        .entries()
        .iter()
        .chain(scene.imported.entries().iter().map(|e| &e.geometry))
        .map(|e| e.vertex_count)
        .sum();
    log::info!(
        "Runtime: {} geometries ({} vertices), {} materials, {} entities, {} lights",
        scene.geometry_count(),
        vertices,
        scene.materials.entries.len(),
        scene.entities.len(),
        scene.lights.directional.len() + scene.lights.point.len() + scene.lights.spot.len()
    );
}

fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.write_sample {
        write_sample(path)?;
    }
    let Some(scene_path) = cli.scene else {
        return Ok(());
    };

    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    log::debug!("Runtime: {config:?}");

    let tasks =
        TaskSystem::new(&config.task_system_config()).context("failed to start the task system")?;
    let (promise, renderer) = renderer_promise::<dyn GraphicsDevice>();

    let backend = config.backend;
    let settings = config.device_settings();
    let bring_up = tasks.thread_exec().spawn(async move {
        let device = device::create_device(backend, &settings);
        log::info!("Runtime: renderer ready on '{}'", device.adapter_name());
        promise.resolve(device);
    });

    let asset_root = config
        .asset_root
        .clone()
        .or_else(|| scene_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let assembler = SceneAssembler::new(
        tasks.thread_pool_exec().clone(),
        renderer,
        AssemblerConfig {
            asset_root,
            startup_deadline: config.startup_deadline(),
            ..AssemblerConfig::default()
        },
    );

    let scene = tasks
        .block_on(assembler.assemble_file(&scene_path))
        .with_context(|| format!("failed to assemble {}", scene_path.display()))?;
    tasks
        .block_on(bring_up)
        .context("device bring-up panicked")?;

    report(&scene);
    // GPU objects go back to the device before the task system stops.
    drop(scene);
    Ok(())
}

fn main() -> ExitCode {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Startup failed: {e:?}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scene_is_required_without_write_sample() {
        assert!(Cli::try_parse_from(["prism-runtime"]).is_err());
        assert!(Cli::try_parse_from(["prism-runtime", "--write-sample", "out.ron"]).is_ok());
    }

    #[test]
    fn backend_flag_parses_lowercase() {
        let cli = Cli::try_parse_from(["prism-runtime", "scene.ron", "--backend", "headless"])
            .unwrap();
        assert_eq!(cli.backend, Some(Backend::Headless));
    }

    #[test]
    fn headless_run_assembles_the_sample_scene() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("sample.ron");
        let args: Vec<std::ffi::OsString> = vec![
            "prism-runtime".into(),
            scene.clone().into(),
            "--backend".into(),
            "headless".into(),
            "--write-sample".into(),
            scene.clone().into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        run(cli).unwrap();
        assert!(SceneDescription::load(&scene).is_ok());
    }
}
