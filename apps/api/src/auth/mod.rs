// Authentication: access-token verification plus a thin proxy over the
// auth provider's sign-up / sign-in / sign-out endpoints.

pub mod extractor;
pub mod handlers;
pub mod provider;
pub mod token;
