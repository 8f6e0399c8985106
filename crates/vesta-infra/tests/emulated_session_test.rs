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


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vesta_core::renderer::{
    BackendDriver, BackendSelectionConfig, CompletionCounter, DescriptorEntry, GpuError,
    GraphicsBackendType, GraphicsDevice, PresentStatus, Queue, QueueType, Swapchain, SyncPoint,
    TextureViewId, WaitStatus,
};
use vesta_core::{GpuSession, SessionConfig};
use vesta_infra::graphics::emulated::EmulatedStats;
use vesta_infra::{ActiveBackend, EmulatedConfig, EmulatedDevice, EmulatedVariant};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn device(variant: EmulatedVariant) -> Arc<EmulatedDevice> {
    Arc::new(
        EmulatedDevice::new(EmulatedConfig {
            variant: Some(variant),
            ..Default::default()
        })
        .expect("emulated device should initialize"),
    )
}

fn session_config(descriptors_per_block: u32) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.backend.driver = BackendDriver::Emulated;
    config.descriptors.descriptors_per_block = descriptors_per_block;
    config
}

/// Records one frame binding `descriptors` freshly allocated descriptors.
fn record_frame(session: &GpuSession<EmulatedDevice>, descriptors: u32, fired: &Arc<AtomicUsize>) {
    let worker = session.async_compute();
    let pool = session.descriptors().clone();
    worker.begin_recording().unwrap();
    worker
        .record(move |_, buffer| {
            let range = pool.allocate(descriptors).expect("descriptor allocation");
            pool.write(&range, 0, DescriptorEntry::Texture(TextureViewId(0)))
                .expect("descriptor write");
            buffer.bind_descriptors(&range);
            buffer.draw(3, 1);
        })
        .unwrap();
    worker.end_recording().unwrap();

    let fired = fired.clone();
    worker
        .on_completed(move || {
            fired.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    worker.submit().unwrap();
}

/// Blocks until the worker has executed every task enqueued so far.
fn flush(session: &GpuSession<EmulatedDevice>) {
    let (sender, receiver) = std::sync::mpsc::channel();
    session
        .async_compute()
        .queue_operation(move |_| {
            let _ = sender.send(());
            Ok(())
        })
        .expect("worker should accept tasks");
    receiver
        .recv_timeout(Duration::from_secs(5))
        .expect("worker should reach the flush");
}

fn assert_clean_execution(stats: &EmulatedStats, frames: u64) {
    assert_eq!(stats.submits(), frames, "one native submit per frame");
    assert_eq!(stats.executed_command_lists(), frames);
    assert_eq!(stats.executed_commands(), frames * 2);
    assert_eq!(
        stats.corrupted_executions(),
        0,
        "no command memory may be reset while the GPU still reads it"
    );
}

#[test]
fn test_session_runs_on_every_emulated_variant() {
    init_logging();

    for variant in EmulatedVariant::ALL {
        // --- 1. ARRANGE ---
        let device = device(variant);
        let session = GpuSession::new(device.clone(), &session_config(8), QueueType::Direct)
            .expect("session should start");
        let fired = Arc::new(AtomicUsize::new(0));

        // --- 2. ACT ---
        for _ in 0..6 {
            record_frame(&session, 4, &fired);
        }
        session.wait_idle().expect("wait_idle should succeed");
        let stats = session.async_compute().stats();
        let counter_value = session.async_compute().completion_counter().completion_value();
        session.shutdown().expect("shutdown should be clean");

        // --- 3. ASSERT ---
        assert_eq!(counter_value, SyncPoint(6), "{variant:?}");
        assert_eq!(stats.native_submits, 6, "{variant:?}");
        assert_eq!(
            fired.load(Ordering::SeqCst),
            6,
            "{variant:?}: every completion callback runs by shutdown"
        );
        assert_clean_execution(device.stats(), 6);
    }
}

#[test]
fn test_empty_submissions_never_reach_the_queue_on_any_variant() {
    init_logging();

    for variant in EmulatedVariant::ALL {
        // --- 1. ARRANGE ---
        let device = device(variant);
        let session = GpuSession::new(device.clone(), &session_config(8), QueueType::Direct)
            .expect("session should start");
        let worker = session.async_compute();
        let before = worker.completion_counter().sync_point();

        // --- 2. ACT ---
        worker.begin_recording().unwrap();
        worker.record(|_, buffer| buffer.draw(3, 1)).unwrap();
        worker.end_recording().unwrap();
        worker.submit().unwrap();
        worker.submit().unwrap();
        session.wait_idle().expect("wait_idle should succeed");

        // --- 3. ASSERT ---
        assert_eq!(device.stats().submits(), 1, "{variant:?}");
        assert_eq!(
            worker.completion_counter().sync_point(),
            before.next(),
            "{variant:?}: one submission advances the sync point by one"
        );
        assert_eq!(worker.stats().native_submits, 1, "{variant:?}");
        session.shutdown().expect("shutdown should be clean");
    }
}

#[test]
fn test_paused_gpu_forces_fresh_contexts_and_blocks() {
    init_logging();

    // --- 1. ARRANGE ---
    let device = device(EmulatedVariant::DescriptorHeap);
    let session = GpuSession::new(device.clone(), &session_config(4), QueueType::Compute)
        .expect("session should start");
    let fired = Arc::new(AtomicUsize::new(0));

    // --- 2. ACT ---
    // Nothing completes while the GPU is paused, so nothing may be reused.
    device.pause_gpu();
    for _ in 0..3 {
        record_frame(&session, 4, &fired);
    }
    flush(&session);
    let paused_completion = session.async_compute().completion_counter().completion_value();
    let paused_blocks = session.descriptors().block_count();

    device.resume_gpu();
    session.wait_idle().expect("wait_idle should succeed");
    for _ in 0..2 {
        record_frame(&session, 4, &fired);
    }
    session.wait_idle().expect("wait_idle should succeed");
    let stats = session.async_compute().stats();
    let blocks = session.descriptors().block_count();

    // --- 3. ASSERT ---
    assert_eq!(paused_completion, SyncPoint::ZERO);
    assert_eq!(paused_blocks, 3, "each paused frame needs its own block");
    assert_eq!(stats.contexts_created, 3);
    assert_eq!(
        stats.contexts_reused, 2,
        "completed command buffers are recycled once the GPU caught up"
    );
    assert!(blocks <= 4, "completed descriptor blocks are recycled");
    assert_clean_execution(device.stats(), 5);
    session.shutdown().expect("shutdown should be clean");
}

#[test]
fn test_device_loss_stops_the_session() {
    init_logging();

    // --- 1. ARRANGE ---
    let device = device(EmulatedVariant::ExplicitTimeline);
    let session = GpuSession::new(device.clone(), &session_config(8), QueueType::Direct)
        .expect("session should start");
    let fired = Arc::new(AtomicUsize::new(0));
    record_frame(&session, 1, &fired);
    session.wait_idle().expect("first frame completes");

    // --- 2. ACT ---
    device.simulate_device_lost();
    let _ = session.async_compute().begin_recording();
    let _ = session.async_compute().record(|_, buffer| buffer.draw(3, 1));
    let _ = session.async_compute().end_recording();
    let _ = session.async_compute().submit();
    let idle = session.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(idle, Err(GpuError::DeviceLost));
    assert!(!session.async_compute().is_running());
    assert_eq!(
        session.async_compute().begin_recording(),
        Err(GpuError::DeviceLost),
        "the fatal error is reported to later producers"
    );
    assert_eq!(session.shutdown(), Err(GpuError::DeviceLost));
}

#[test]
fn test_explicit_timeline_presents_only_acquired_images() {
    init_logging();

    // --- 1. ARRANGE ---
    let device = device(EmulatedVariant::ExplicitTimeline);
    let session = GpuSession::new(device.clone(), &session_config(8), QueueType::Direct)
        .expect("session should start");
    let mut swapchain = device.create_swapchain(320, 240).unwrap();
    let (sender, receiver) = std::sync::mpsc::channel();

    // --- 2. ACT ---
    let fired = Arc::new(AtomicUsize::new(0));
    record_frame(&session, 1, &fired);
    let counter = session.async_compute().completion_counter().clone();
    session
        .async_compute()
        .queue_operation(move |queue| {
            let unacquired = queue.present(&mut swapchain, &[]);
            swapchain.prepare_next_frame()?;
            let presented = queue.present(&mut swapchain, &[&*counter])?;
            swapchain.invalidate();
            swapchain.prepare_next_frame().unwrap_err();
            let out_of_date = queue.present(&mut swapchain, &[])?;
            let _ = sender.send((unacquired.is_err(), presented, out_of_date));
            Ok(())
        })
        .unwrap();
    let (unacquired_failed, presented, out_of_date) = receiver
        .recv_timeout(Duration::from_secs(5))
        .expect("queue operation should run");
    session.wait_idle().expect("wait_idle should succeed");

    // --- 3. ASSERT ---
    assert!(unacquired_failed, "presenting needs an acquired image");
    assert_eq!(presented, PresentStatus::Presented);
    assert_eq!(out_of_date, PresentStatus::OutOfDate);
    assert_eq!(device.stats().presents(), 1);
    assert_eq!(
        session.async_compute().completion_counter().sync_point(),
        SyncPoint(2),
        "present signalled the worker's counter"
    );
    session.shutdown().expect("shutdown should be clean");
}

#[test]
fn test_cross_queue_wait_orders_execution() {
    init_logging();

    // --- 1. ARRANGE ---
    let device = device(EmulatedVariant::DescriptorHeap);
    let mut compute = device.create_queue(QueueType::Compute).unwrap();
    let mut direct = device.create_queue(QueueType::Direct).unwrap();
    let upstream = device.create_completion_counter(Some("Upstream")).unwrap();
    let downstream = device.create_completion_counter(Some("Downstream")).unwrap();

    // --- 2. ACT ---
    device.pause_gpu();
    let awaited = upstream.sync_point().next();
    direct.wait(&upstream, awaited).unwrap();
    let signalled = direct.signal(&downstream).unwrap();
    device.resume_gpu();
    let before = downstream.wait_for(signalled, Duration::from_millis(30)).unwrap();
    compute.signal(&upstream).unwrap();
    let after = downstream.wait_for(signalled, Duration::from_secs(5)).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(before, WaitStatus::TimedOut);
    assert_eq!(after, WaitStatus::Complete);
    assert_eq!(compute.wait_idle(Duration::from_secs(5)).unwrap(), WaitStatus::Complete);
}

#[test]
fn test_backend_selection_builds_an_emulated_device() {
    init_logging();

    // --- 1. ARRANGE ---
    let config = BackendSelectionConfig {
        driver: BackendDriver::Emulated,
        preferred_backends: vec![GraphicsBackendType::Vulkan, GraphicsBackendType::OpenGL],
        ..Default::default()
    };

    // --- 2. ACT ---
    let selection = ActiveBackend::select(&config, &EmulatedConfig::default())
        .expect("an emulated backend should be selected");

    // --- 3. ASSERT ---
    assert_eq!(selection.adapter_info.backend_type, GraphicsBackendType::Vulkan);
    assert_eq!(selection.attempted_backends, vec![GraphicsBackendType::Vulkan]);
    match selection.device {
        ActiveBackend::Emulated(device) => {
            assert_eq!(device.variant(), EmulatedVariant::ExplicitTimeline)
        }
        #[allow(unreachable_patterns)]
        _ => panic!("expected the emulated driver"),
    }
}
