pub mod alignment;
pub mod feature;
pub mod operations;
pub mod search;
pub mod sequence;

pub use feature::*;
pub use sequence::*;
