pub mod size;
pub mod title;
