//! Session Commands

use crate::domain::DomainResult;
use crate::service::Identity;
use crate::AppState;

/// Handle a sign-in or identity switch, then reconcile for the new identity.
///
/// Returns the number of tasks removed by the anonymous identity cleanup.
pub async fn change_identity(state: &AppState, previous: Option<&Identity>, current: &Identity) -> DomainResult<usize> {
    let removed = state.service.on_identity_change(previous, current).await?;
    state.service.refresh(&current.uid).await?;
    Ok(removed)
}
