pub mod capabilities;
pub mod extraction;
pub mod processor;
pub mod readability;
pub mod structuring;

pub use capabilities::*;
pub use processor::*;
