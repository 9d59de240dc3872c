pub mod frame_recorder;
