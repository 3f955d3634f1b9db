pub mod document;
pub mod parameter;
pub mod patient;

pub use document::*;
pub use parameter::*;
pub use patient::*;
