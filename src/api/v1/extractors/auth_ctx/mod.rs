/**
 * Responsibility
 *  - core と types を束ねる
 */
mod core;
mod types;

pub use types::AuthCtx;
