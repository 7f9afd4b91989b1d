//! Engine
//!
//! Pure functions over domain values: reconciliation against the catalog,
//! completion evaluation, bracket expansion and friend matching. Nothing
//! here touches storage or the clock.

mod brackets;
mod evaluate;
mod reconcile;
mod sharing;

pub use brackets::{expand_all, expand_task, resolve_brackets, Bracket, PlannerTask};
pub use evaluate::{evaluate, server_weekday, TaskStatus, LAZY_GRACE_DAYS, SERVER_DAY_OFFSET_HOURS};
pub use reconcile::{reconcile, Reconciliation};
pub use sharing::{
    match_shared_tasks, shareable_tasks, CharacterRow, FriendCharacter, FriendData, FriendHelp, SharingBoard,
    SharingInput, TaskRow,
};
