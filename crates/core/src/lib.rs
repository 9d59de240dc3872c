//! Core playback library: frame sources, recorders and the lock-guarded
//! playback controller that coordinates them under user-driven
//! seek/play/record state.

pub mod playback;
pub mod record;
pub mod shared;
pub mod source;
