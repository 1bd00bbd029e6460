pub mod config;
pub mod logging;
pub mod paths;

pub mod cache;
pub mod context;
pub mod detect;
pub mod fetch;
pub mod hash;
pub mod outcome;
pub mod pipeline;
pub mod precheck;
pub mod selfupdate;
pub mod tasks;
pub mod update;
