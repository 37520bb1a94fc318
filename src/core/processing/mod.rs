pub mod bbox;
pub mod cleanup;
pub mod denoise;
pub mod grid;
pub mod normalize;
pub mod padding;
pub mod pipeline;
pub mod resize;
