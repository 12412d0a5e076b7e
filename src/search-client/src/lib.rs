mod client;
mod error;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::SearchClient;
pub use error::SearchError;
