pub mod interpolated;
pub mod smoothing;

pub use interpolated::*;
pub use smoothing::*;
