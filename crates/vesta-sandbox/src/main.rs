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


// Vesta Sandbox
// Drives a GPU session headless: selects a backend from a RON file, records
// and submits frames through the async compute worker, then reports.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vesta_core::renderer::{
    DescriptorEntry, DescriptorRange, GraphicsDevice, QueueType, SyncPoint, TextureViewId,
};
use vesta_core::{GpuSession, SessionConfig};
use vesta_infra::graphics::emulated::EmulatedCommandBuffer;
use vesta_infra::graphics::wgpu::WgpuCommandBuffer;
use vesta_infra::{ActiveBackend, EmulatedConfig};

const DEFAULT_CONFIG_PATH: &str = "sandbox.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct SandboxConfig {
    session: SessionConfig,
    emulated: EmulatedConfig,
    queue: QueueType,
    frames: u32,
    descriptors_per_frame: u32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            emulated: EmulatedConfig::default(),
            queue: QueueType::Compute,
            frames: 60,
            descriptors_per_frame: 4,
        }
    }
}

impl SandboxConfig {
    /// Loads the file given on the command line, else `sandbox.ron` if it
    /// exists, else the defaults.
    fn load() -> Result<Self> {
        let path = match std::env::args().nth(1) {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH.to_string(),
            None => {
                log::info!("No configuration file, using defaults.");
                return Ok(Self::default());
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read '{path}'"))?;
        let config: SandboxConfig =
            ron::de::from_str(&text).with_context(|| format!("Failed to parse '{path}'"))?;
        config.session.validate()?;
        log::info!("Loaded sandbox configuration from '{path}'.");
        Ok(config)
    }
}

/// Records and submits `config.frames` frames, each binding freshly
/// allocated descriptors, then waits for the GPU and shuts the session down.
fn run<D, R>(device: Arc<D>, config: &SandboxConfig, record: R) -> Result<()>
where
    D: GraphicsDevice,
    R: Fn(&mut D::CommandBuffer, SyncPoint, Option<&DescriptorRange>) + Copy + Send + 'static,
{
    let session = GpuSession::new(device, &config.session, config.queue)?;
    let completed_frames = Arc::new(AtomicU32::new(0));
    let start = Instant::now();

    for _ in 0..config.frames {
        let worker = session.async_compute();
        let pool = session.descriptors().clone();
        let descriptors = config.descriptors_per_frame;

        worker.begin_recording()?;
        worker.record(move |sync_point, buffer| {
            let range = match pool.allocate(descriptors) {
                Ok(range) => Some(range),
                Err(e) => {
                    log::error!("Frame {sync_point}: {e}");
                    None
                }
            };
            if let Some(range) = &range {
                for offset in 0..range.count {
                    let entry = DescriptorEntry::Texture(TextureViewId(offset as usize));
                    if let Err(e) = pool.write(range, offset, entry) {
                        log::error!("Frame {sync_point}: {e}");
                    }
                }
            }
            record(buffer, sync_point, range.as_ref());
        })?;
        worker.end_recording()?;

        let completed_frames = completed_frames.clone();
        worker.on_completed(move || {
            completed_frames.fetch_add(1, Ordering::Relaxed);
        })?;
        worker.submit()?;
    }

    session.wait_idle()?;
    let stats = session.async_compute().stats();
    let blocks = session.descriptors().block_count();
    session.shutdown()?;

    log::info!(
        "{} frames in {:.2?}: {} submits, {} command buffers created, {} reused, {} descriptor blocks.",
        completed_frames.load(Ordering::Relaxed),
        start.elapsed(),
        stats.native_submits,
        stats.contexts_created,
        stats.contexts_reused,
        blocks
    );
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let config = SandboxConfig::load()?;
    let selection = ActiveBackend::select(&config.session.backend, &config.emulated)?;
    log::info!(
        "Running on \"{}\" ({:?}), selected in {} ms after trying {:?}.",
        selection.adapter_info.name,
        selection.adapter_info.backend_type,
        selection.selection_time_ms,
        selection.attempted_backends
    );

    match selection.device {
        ActiveBackend::Wgpu(device) => run(
            device,
            &config,
            |buffer: &mut WgpuCommandBuffer, sync_point: SyncPoint, _: Option<&DescriptorRange>| {
                if let Some(encoder) = buffer.encoder() {
                    encoder.insert_debug_marker(&format!("Sandbox frame {sync_point}"));
                }
            },
        ),
        ActiveBackend::Emulated(device) => {
            run(
                device.clone(),
                &config,
                |buffer: &mut EmulatedCommandBuffer,
                 _: SyncPoint,
                 range: Option<&DescriptorRange>| {
                    if let Some(range) = range {
                        buffer.bind_descriptors(range);
                    }
                    buffer.draw(3, 1);
                },
            )?;
            let stats = device.stats();
            log::info!(
                "Emulated GPU executed {} command lists ({} commands), {} corrupted.",
                stats.executed_command_lists(),
                stats.executed_commands(),
                stats.corrupted_executions()
            );
            Ok(())
        }
    }
}
