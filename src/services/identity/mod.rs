pub mod client;
pub mod firebase;

pub use client::{DecodedClaims, IdentityError, IdentityProvider, ProviderSession, ProviderUser};
pub use firebase::FirebaseAuth;
