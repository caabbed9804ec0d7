pub mod base;
pub mod dirty_worker;
pub mod importer;

pub use base::*;
pub use dirty_worker::{DirtyWorker, WorkerRunStats};
pub use importer::{ActivityImporter, ImportConfig, ImportStats};
