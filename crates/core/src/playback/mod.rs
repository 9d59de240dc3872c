pub mod controller;
pub mod keymap;
pub mod play_bound;
pub mod pump;
