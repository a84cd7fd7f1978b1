pub mod color;
pub mod export;
pub mod palette;
