//! Accounts, password hashing, and the session passed to privileged operations.

pub mod password;
pub mod router;
pub mod session;
pub mod users;

pub use password::{PasswordError, PasswordHasher};
pub use router::identity_router;
pub use session::{Role, Session};
pub(crate) use users::insert_user;
pub use users::{AccountStatus, IdentityError, UserAccount, UserDirectory};
