pub mod png_sequence_recorder;
pub mod png_writer;
