pub mod path_utils;
pub mod platform;

pub use path_utils::*;
pub use platform::Platform;
