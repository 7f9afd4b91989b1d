//! Commands Layer
//!
//! Application-facing operations, one async function per user action.
//! A UI shell calls these and stringifies the errors.

mod task_cmd;
mod completion_cmd;
mod roster_cmd;
mod planner_cmd;
mod session_cmd;


pub use task_cmd::*;
pub use completion_cmd::*;
pub use roster_cmd::*;
pub use planner_cmd::*;
pub use session_cmd::*;
