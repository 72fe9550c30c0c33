//! Refresh token acquisition for a user.
//!
//! A stored token is always reused, since the provider's refresh tokens do
//! not expire. Only when none is stored is the authorization code exchanged,
//! and the result saved. Authorization codes are single-use at the provider;
//! nothing here guards against exchanging the same code twice.

use tracing::{error, info, warn};

use super::repository::{TokenRecord, TokenRepository};
use crate::error::AppError;
use crate::oauth::OAuthClient;

/// Return the user's refresh token, exchanging `auth_code` if none is stored.
///
/// Store failures never fail the call: a lookup error reads as "not stored"
/// and a save error leaves the freshly exchanged token usable for this
/// request.
pub async fn acquire_refresh_token(
    store: &dyn TokenRepository,
    oauth: &dyn OAuthClient,
    external_user_id: &str,
    auth_code: Option<&str>,
) -> Result<String, AppError> {
    let stored = match store.find(external_user_id).await {
        Ok(found) => found,
        Err(e) => {
            error!("Token lookup for {external_user_id} failed, treating as not found: {e}");
            None
        }
    };

    if let Some(record) = stored {
        info!("Refresh token found for user {external_user_id}");
        return Ok(record.refresh_token);
    }

    info!("User {external_user_id} doesn't have a stored token, requesting a new one");

    let code = match auth_code {
        Some(code) if !code.is_empty() => code,
        _ => return Err(AppError::MissingAuthorizationCode),
    };

    let grant = oauth.exchange_code(code).await?;

    let record = TokenRecord::new(external_user_id, grant.refresh_token, grant.raw);
    if let Err(e) = store.save(&record).await {
        warn!("Can't store the token for {external_user_id}: {e}");
    }

    Ok(record.refresh_token)
}
