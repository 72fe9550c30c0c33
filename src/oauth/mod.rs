//! OAuth client adapter for the identity provider.

mod google;
mod traits;

pub use google::GoogleOAuthClient;
pub use traits::{OAuthClient, TokenGrant};
