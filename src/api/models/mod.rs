pub mod autocomplete;
pub mod system;

pub use autocomplete::*;
pub use system::*;
