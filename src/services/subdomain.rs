use uuid::Uuid;

use super::error::{PortfolioError, PortfolioResult};
use crate::db::{PortfolioStore, StoreResult};

pub const MIN_SUBDOMAIN_LEN: usize = 3;

/// Format rule: at least three ASCII letters or digits, nothing else.
pub fn validate(subdomain: &str) -> PortfolioResult<()> {
    if subdomain.len() < MIN_SUBDOMAIN_LEN {
        return Err(PortfolioError::Validation(format!(
            "subdomain must be at least {MIN_SUBDOMAIN_LEN} characters"
        )));
    }
    if !subdomain.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PortfolioError::Validation(
            "subdomain must be alphanumeric".to_string(),
        ));
    }
    Ok(())
}

/// Advisory pre-check: is `subdomain` bound to a portfolio other than
/// `excluding`? The store's unique index remains the final authority.
pub async fn is_taken(
    store: &dyn PortfolioStore,
    subdomain: &str,
    excluding: Option<Uuid>,
) -> StoreResult<bool> {
    let existing = store.find_by_subdomain(subdomain).await?;
    Ok(existing.is_some_and(|p| Some(p.id) != excluding))
}
