//! Timestamp capture for notes being composed.
//!
//! People start typing a note a moment after the thing they want to
//! remember. A [`CaptureSession`] records the playback position when the
//! input first becomes non-empty, shifted back by [`CAPTURE_BIAS_SECS`],
//! and uses it when the note is submitted.

pub mod session;

pub use session::{biased_start, fetch_position, CaptureSession, CaptureState, CaptureTicket};

/// How far before the first keystroke a captured timestamp is placed.
pub const CAPTURE_BIAS_SECS: f64 = 5.0;
