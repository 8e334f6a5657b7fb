use uuid::Uuid;

use super::error::{PortfolioError, PortfolioResult};

/// Ownership guard applied to every mutation, after the existence check.
///
/// Only the identity that created a portfolio may change it or anything
/// nested inside it.
pub fn authorize(owner: Uuid, requester: Uuid) -> PortfolioResult<()> {
    if owner == requester {
        Ok(())
    } else {
        tracing::warn!(%owner, %requester, "ownership check denied");
        Err(PortfolioError::Unauthorized)
    }
}
