//! Concrete installer tasks. Each task is in its own file for clarity.

mod download;
mod init;
mod prechecks;

pub use download::DownloadModTask;
pub use init::InitTask;
pub use prechecks::PreCheckTask;
