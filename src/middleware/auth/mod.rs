mod guard;

pub use guard::{require_super_admin, require_user};
