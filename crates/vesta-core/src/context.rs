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


//! The session object that owns a device and its submission engine.

use crate::renderer::{
    AsyncComputeConfig, AsyncComputeThread, BackendSelectionConfig, ConfigError,
    DescriptorPool, DescriptorPoolConfig, GpuError, GraphicsDevice, QueueType, SubmissionListener,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Every tunable of a [`GpuSession`], loadable from a RON document.
///
/// Missing fields fall back to their defaults, so an empty `()` is a valid
/// configuration:
///
/// ```
/// use vesta_core::SessionConfig;
///
/// let config = SessionConfig::from_ron_str("(async_compute: (thread_name: \"Gpu\"))").unwrap();
/// assert_eq!(config.async_compute.thread_name, "Gpu");
/// assert_eq!(config.descriptors.descriptors_per_block, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How the backend is chosen at startup.
    pub backend: BackendSelectionConfig,
    /// The async compute worker.
    pub async_compute: AsyncComputeConfig,
    /// The session's descriptor pool.
    pub descriptors: DescriptorPoolConfig,
}

impl SessionConfig {
    /// Parses and validates a configuration from RON text.
    ///
    /// ## Errors
    /// * `ConfigError::Parse` - If the text is not a valid configuration.
    /// * `ConfigError::Invalid` - If a value is unusable.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig =
            ron::de::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// ## Errors
    /// * `ConfigError::Io` - If the file cannot be read.
    /// * Any error of [`from_ron_str`](Self::from_ron_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::info!("Loaded session configuration from '{}'.", path.display());
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty_config).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks the values serde cannot check.
    ///
    /// ## Errors
    /// * `ConfigError::Invalid` - Naming the first unusable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.async_compute.thread_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "async_compute.thread_name must not be empty".to_string(),
            ));
        }
        if self.descriptors.descriptors_per_block == 0 {
            return Err(ConfigError::Invalid(
                "descriptors.descriptors_per_block must be at least 1".to_string(),
            ));
        }
        if self.descriptors.shader_visible && !self.descriptors.kind.supports_shader_visibility() {
            return Err(ConfigError::Invalid(format!(
                "{:?} descriptor heaps cannot be shader visible",
                self.descriptors.kind
            )));
        }
        if self.backend.preferred_backends.is_empty() {
            return Err(ConfigError::Invalid(
                "backend.preferred_backends must name at least one backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// The explicit context object owning a device, its async compute worker and
/// its descriptor pool.
///
/// There is no global device: whatever needs the GPU receives the session (or
/// one of its parts) explicitly. Dropping the session terminates the worker.
pub struct GpuSession<D: GraphicsDevice> {
    device: Arc<D>,
    descriptors: Arc<DescriptorPool<D>>,
    // Declared last: the worker is dropped, and so terminated, after the
    // session's other handles.
    async_compute: AsyncComputeThread<D>,
}

impl<D: GraphicsDevice> GpuSession<D> {
    /// Creates the session: spawns the worker and hands it a queue of `queue_type`.
    ///
    /// The descriptor pool is registered as a submission listener so its blocks
    /// are retired and recycled in step with the worker's submissions.
    ///
    /// ## Errors
    /// Any [`GpuError`] raised while creating the pool, the worker or the queue.
    pub fn new(
        device: Arc<D>,
        config: &SessionConfig,
        queue_type: QueueType,
    ) -> Result<Self, GpuError> {
        let descriptors = Arc::new(DescriptorPool::new(
            device.clone(),
            config.descriptors.clone(),
        )?);
        let listener: Arc<dyn SubmissionListener> = descriptors.clone();
        let async_compute = AsyncComputeThread::with_listeners(
            device.clone(),
            config.async_compute.clone(),
            vec![listener],
        )?;
        async_compute.set_queue(device.create_queue(queue_type)?)?;

        log::info!(
            "GPU session created on '{}' ({:?}).",
            device.adapter_info().name,
            device.adapter_info().backend_type
        );

        Ok(Self {
            device,
            descriptors,
            async_compute,
        })
    }

    /// The device the session was created on.
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// The session's async compute worker.
    pub fn async_compute(&self) -> &AsyncComputeThread<D> {
        &self.async_compute
    }

    /// The session's descriptor pool.
    pub fn descriptors(&self) -> &Arc<DescriptorPool<D>> {
        &self.descriptors
    }

    /// Blocks until all submitted work has completed.
    pub fn wait_idle(&self) -> Result<(), GpuError> {
        self.async_compute.wait_idle()
    }

    /// Terminates the worker and reports how it ended.
    pub fn shutdown(self) -> Result<(), GpuError> {
        log::info!("Shutting down GPU session.");
        self.async_compute.join()
    }
}

impl<D: GraphicsDevice> std::fmt::Debug for GpuSession<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuSession")
            .field("device", &self.device)
            .field("async_compute", &self.async_compute)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::test_support::{flush, ManualDevice};
    use crate::renderer::{DescriptorHeapKind, SyncPoint};

    #[test]
    fn empty_document_yields_defaults() {
        let config = SessionConfig::from_ron_str("()").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn config_round_trips_through_ron() {
        let mut config = SessionConfig::default();
        config.async_compute.completion_poll_interval_ms = 4;
        config.descriptors.kind = DescriptorHeapKind::Sampler;

        let text = config.to_ron_string().unwrap();
        assert_eq!(SessionConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            SessionConfig::from_ron_str("(descriptors: (descriptors_per_block: 0))"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SessionConfig::from_ron_str("(descriptors: (kind: RenderTarget, shader_visible: true))"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SessionConfig::from_ron_str("(async_compute: (thread_name: 42))"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SessionConfig::load("/definitely/not/here/session.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn session_recycles_descriptor_blocks_with_submissions() {
        let device = Arc::new(ManualDevice::new());
        let mut config = SessionConfig::default();
        config.descriptors.descriptors_per_block = 1;
        config.async_compute.terminate_timeout_ms = 20;
        let session = GpuSession::new(device.clone(), &config, QueueType::Direct).unwrap();

        session.descriptors().allocate(1).unwrap();
        session.descriptors().allocate(1).unwrap();

        let worker = session.async_compute();
        worker.begin_recording().unwrap();
        worker.record(|_, buffer| buffer.record("draw")).unwrap();
        worker.end_recording().unwrap();
        worker.submit().unwrap();
        flush(worker);
        assert_eq!(session.descriptors().pending_block_count(), 1);

        worker.completion_counter().complete(1);
        session.wait_idle().unwrap();
        assert!(worker.is_execution_completed(SyncPoint(1)));

        // The block filled before #1 may still be bound by #2, so it is held
        // until #2 completes.
        let frame = || {
            worker.begin_recording().unwrap();
            worker.record(|_, buffer| buffer.record("draw")).unwrap();
            worker.end_recording().unwrap();
            worker.submit().unwrap();
            flush(worker);
        };
        frame();
        assert_eq!(session.descriptors().free_block_count(), 0);

        worker.completion_counter().complete(2);
        frame();
        assert_eq!(session.descriptors().free_block_count(), 1);
        assert_eq!(session.descriptors().pending_block_count(), 0);

        session.shutdown().unwrap();
    }
}
