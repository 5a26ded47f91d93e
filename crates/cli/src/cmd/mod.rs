//! CLI command implementations

pub mod check;
pub mod scan;
pub mod status;
pub mod watch;
