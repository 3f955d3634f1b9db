pub mod document;
pub mod parameter;

pub use document::*;
pub use parameter::*;
