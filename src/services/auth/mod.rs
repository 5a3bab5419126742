pub mod factory;
pub mod verifier;

pub use factory::{build_auth_service, build_identity_provider};
pub use verifier::{AuthError, AuthService};
