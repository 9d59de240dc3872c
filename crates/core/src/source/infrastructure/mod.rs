pub mod ffmpeg_file_source;
pub mod pattern_source;
