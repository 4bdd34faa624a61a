use tracing::{info, warn};

use crate::{
    model::{City, Resolution, Window},
    provider::{FetchQuery, Provider},
};

/// Try `chain` in order and return the first success.
///
/// Each provider is attempted at most once. When every provider fails the
/// result is `Unavailable`, which is rendered rather than treated as an error.
pub async fn resolve<T: Send>(
    city: &City,
    window: Window,
    chain: &[Box<dyn Provider<T>>],
    query: &FetchQuery,
) -> Resolution<T> {
    for (attempt, provider) in chain.iter().enumerate() {
        match provider.fetch(query).await {
            Ok(value) => {
                info!(city = %city.name, %window, provider = %provider.id(), attempt, "resolved");
                return Resolution::Resolved(value);
            }
            Err(e) => {
                warn!(city = %city.name, %window, provider = %provider.id(), error = %e, "provider failed");
                if let Some(next) = chain.get(attempt + 1) {
                    info!(city = %city.name, %window, next = %next.id(), "falling back");
                }
            }
        }
    }

    warn!(city = %city.name, %window, tried = chain.len(), "all providers failed, data unavailable");
    Resolution::Unavailable
}
