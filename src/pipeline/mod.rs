pub mod capture_loop;
pub mod command;
pub mod frame_buffer;

pub use capture_loop::{CaptureHealth, CaptureLoop};
pub use command::CommandChannel;
pub use frame_buffer::{FrameBuffer, FrameTap};
