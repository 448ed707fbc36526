//! External collaborators: HTTP link verification and paper downloads.

mod error;
pub mod download;
pub mod verify;

#[cfg(test)]
mod testing;

pub use download::{DownloadConfig, DownloadSummary, Fetcher, safe_file_name};
pub use error::FetchError;
pub use verify::{LinkVerifier, Reachability, VerifiedTable, VerifyConfig};
