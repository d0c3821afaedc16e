//! End-to-end tests of the assembled monitoring node against the
//! synthetic capture device.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use argus::device::{stub::StubState, StubDevice};
use argus::{MonitorNode, NodeConfig};
use tokio::time::sleep;

fn test_config(captures_dir: &Path) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.capture.lores_width = 32;
    config.capture.lores_height = 16;
    config.capture.main_width = 64;
    config.capture.main_height = 32;
    config.capture.fps = 100;
    config.capture.default_focus = 2.0;
    config.capture.failure_threshold = 3;
    config.motion.interval_ms = 10;
    // Port 9 (discard) is refused on any sane test host.
    config.motion.sink_url = "http://127.0.0.1:9/motion".to_string();
    config.motion.sink_timeout_secs = 1;
    config.recording.captures_dir = captures_dir.to_path_buf();
    config.recording.max_duration_secs = 1;
    config.recording.cutoff_check_secs = 1;
    config
}

async fn start_node(config: NodeConfig) -> (MonitorNode, Arc<Mutex<StubState>>) {
    let device = StubDevice::new(
        (config.capture.lores_width, config.capture.lores_height),
        (config.capture.main_width, config.capture.main_height),
        35.0,
    );
    let state = device.state();
    let node = MonitorNode::start(device, config).await.expect("node starts");
    (node, state)
}

async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn toggle_recording_alternates_strictly() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    // Keep the cutoff out of this test's way.
    config.recording.max_duration_secs = 600;
    let (node, state) = start_node(config).await;

    assert!(!node.is_recording());

    for cycle in 0u64..2 {
        node.trigger_toggle_recording();
        wait_until("recording to start", || node.is_recording()).await;
        {
            let state = state.lock().unwrap();
            assert_eq!(state.recordings_started, cycle + 1);
            let path = state.recording_to.as_ref().expect("device is recording");
            assert!(path.to_string_lossy().ends_with(".mp4"));
        }

        node.trigger_toggle_recording();
        wait_until("recording to stop", || !node.is_recording()).await;
        let state = state.lock().unwrap();
        assert_eq!(state.recordings_stopped, cycle + 1);
        assert!(state.recording_to.is_none());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn recording_cuts_off_after_max_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (node, state) = start_node(test_config(dir.path())).await;

    node.trigger_toggle_recording();
    wait_until("recording to start", || node.is_recording()).await;

    // max_duration 1s + check interval 1s, with slack for scheduling.
    let started = Instant::now();
    wait_until("autonomous cutoff", || !node.is_recording()).await;
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(state.lock().unwrap().recordings_stopped, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn focus_requests_are_clamped_into_device_range() {
    let dir = tempfile::tempdir().unwrap();
    let (node, state) = start_node(test_config(dir.path())).await;

    wait_until("default focus applied", || node.current_focus() == 2.0).await;
    assert_eq!(state.lock().unwrap().focus, 2.0);

    node.trigger_adjust_focus(-10.0);
    wait_until("underflow clamped to 0", || node.current_focus() == 0.0).await;
    assert_eq!(state.lock().unwrap().focus, 0.0);

    node.trigger_adjust_focus(1000.0);
    wait_until("overflow clamped to max", || node.current_focus() == 35.0).await;
    assert_eq!(state.lock().unwrap().focus, 35.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn still_capture_writes_timestamped_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let (node, state) = start_node(test_config(dir.path())).await;

    node.trigger_capture_still();
    wait_until("still file to appear", || {
        std::fs::read_dir(dir.path())
            .map(|entries| {
                entries
                    .flatten()
                    .any(|e| e.metadata().map(|m| m.len() > 2).unwrap_or(false))
            })
            .unwrap_or(false)
    })
    .await;

    let entry = std::fs::read_dir(dir.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    let name = entry.file_name().into_string().unwrap();
    assert!(name.starts_with("img_"));
    assert!(name.ends_with(".jpg"));

    let data = std::fs::read(entry.path()).unwrap();
    assert_eq!(&data[..2], &[0xFF, 0xD8], "JPEG SOI marker");
    assert_eq!(state.lock().unwrap().main_captures, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stream_yields_distinct_jpeg_frames() {
    let dir = tempfile::tempdir().unwrap();
    let (node, _state) = start_node(test_config(dir.path())).await;

    let first = node.next_stream_frame().await.unwrap();
    let second = node.next_stream_frame().await.unwrap();

    assert_eq!(&first[..2], &[0xFF, 0xD8]);
    assert_eq!(&second[..2], &[0xFF, 0xD8]);
    // The stub shifts its gradient every capture, so consecutive
    // stream frames encode differently.
    assert_ne!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn persistent_capture_failures_raise_and_clear_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let device = StubDevice::new((32, 16), (64, 32), 35.0);
    let state = device.state();
    state.lock().unwrap().fail_captures = true;

    let node = MonitorNode::start(device, config).await.unwrap();

    wait_until("degraded flag to raise", || node.is_degraded()).await;

    state.lock().unwrap().fail_captures = false;
    wait_until("degraded flag to clear", || !node.is_degraded()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_motion_sink_never_stalls_the_node() {
    let dir = tempfile::tempdir().unwrap();
    let (node, state) = start_node(test_config(dir.path())).await;

    // Long enough for well over ten failed sink deliveries.
    sleep(Duration::from_millis(500)).await;

    // The capture side and the other consumers are unaffected.
    assert!(!node.is_degraded());
    let frame = node.next_stream_frame().await.unwrap();
    assert_eq!(&frame[..2], &[0xFF, 0xD8]);
    assert!(state.lock().unwrap().lores_captures > 1);
}
