// Library management module
// This module handles clip discovery and selection

pub mod scanner;
pub mod shuffle;

pub use scanner::{Catalog, DirectoryScanner, ScanError};
pub use shuffle::Shuffler;
