pub mod cli;
pub mod config;
pub mod model;
pub mod storage;

pub use model::{DocumentRecord, Snapshot};
