pub mod auth_ctx;
pub mod search_criteria;

pub use auth_ctx::AuthCtx;
pub use search_criteria::SearchCriteria;
