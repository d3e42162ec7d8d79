pub mod onedrive;

pub use onedrive::*;
