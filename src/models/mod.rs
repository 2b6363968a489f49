pub mod order;
pub mod seen;

pub use order::*;
pub use seen::SeenSet;
