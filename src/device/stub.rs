//! Synthetic capture device for tests and hardware-less runs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytes::Bytes;

use crate::device::{CaptureDevice, Frame, FrameMetadata, PixelFormat};
use crate::error::DeviceError;
use crate::CaptureConfig;

/// Observable side effects of the stub, shared with the test that built it.
#[derive(Debug, Default)]
pub struct StubState {
    pub recording_to: Option<PathBuf>,
    pub focus: f64,
    pub lores_captures: u64,
    pub main_captures: u64,
    pub recordings_started: u64,
    pub recordings_stopped: u64,
    /// When set, preview captures fail until cleared.
    pub fail_captures: bool,
}

/// Generates shifting gradient frames and records state transitions
/// instead of driving a sensor or an encoder.
pub struct StubDevice {
    lores: (u32, u32),
    main: (u32, u32),
    max_focus: f64,
    sequence: u64,
    state: Arc<Mutex<StubState>>,
}

impl StubDevice {
    pub fn new(lores: (u32, u32), main: (u32, u32), max_focus: f64) -> Self {
        Self {
            lores,
            main,
            max_focus,
            sequence: 0,
            state: Arc::new(Mutex::new(StubState::default())),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(
            (config.lores_width, config.lores_height),
            (config.main_width, config.main_height),
            35.0,
        )
    }

    /// Handle onto the stub's observable state. Grab it before the
    /// device moves into the actor.
    pub fn state(&self) -> Arc<Mutex<StubState>> {
        Arc::clone(&self.state)
    }

    fn synthesize(&mut self, width: u32, height: u32) -> Frame {
        self.sequence += 1;
        // Shift by a step coarser than JPEG quantization so consecutive
        // frames never encode to identical bytes.
        let shift = (self.sequence * 17) % 256;
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x as u64 + y as u64 + shift) % 256) as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame {
            data: Bytes::from(data),
            meta: Arc::new(FrameMetadata {
                sequence: self.sequence,
                width,
                height,
                format: PixelFormat::Rgb24,
            }),
            timestamp: Instant::now(),
        }
    }
}

impl CaptureDevice for StubDevice {
    fn capture_lores(&mut self) -> Result<Frame, DeviceError> {
        {
            let mut state = self.state.lock().unwrap();
            if state.fail_captures {
                return Err(DeviceError::Capture("synthetic failure".into()));
            }
            state.lores_captures += 1;
        }
        let (w, h) = self.lores;
        Ok(self.synthesize(w, h))
    }

    fn capture_main(&mut self) -> Result<Frame, DeviceError> {
        self.state.lock().unwrap().main_captures += 1;
        let (w, h) = self.main;
        Ok(self.synthesize(w, h))
    }

    fn start_recording(&mut self, path: &Path) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if state.recording_to.is_some() {
            return Err(DeviceError::Recording("already recording".into()));
        }
        state.recording_to = Some(path.to_path_buf());
        state.recordings_started += 1;
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if state.recording_to.take().is_none() {
            return Err(DeviceError::Recording("not recording".into()));
        }
        state.recordings_stopped += 1;
        Ok(())
    }

    fn set_focus(&mut self, value: f64) -> Result<(), DeviceError> {
        self.state.lock().unwrap().focus = value;
        Ok(())
    }

    fn max_focus(&self) -> f64 {
        self.max_focus
    }
}
