//! Pipeline scenarios
//!
//! Each module drives real files through the pipeline and checks the calls
//! that reached the fake Eagle.

mod failures;
mod folders;
mod watch;
