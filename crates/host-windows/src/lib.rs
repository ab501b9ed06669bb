pub mod export;

#[cfg(windows)]
mod elevation;
#[cfg(not(windows))]
#[path = "elevation_stub.rs"]
mod elevation;

pub use elevation::elevation_status;
pub use export::{count_package_dirs, DismExporter};
