// Organization role policy and membership resolution

pub mod error;
pub mod guard;
pub mod permission;

pub use error::{AuthzError, Result};
pub use guard::{AccessGuard, Membership};
pub use permission::{Permission, RolePolicy};
