//! CLI command handlers. Each command is in its own file for clarity.

mod cache;
mod checksum;
mod install;
mod update;

pub use cache::run_cache;
pub use checksum::run_checksum;
pub use install::run_install;
pub use update::run_update;
