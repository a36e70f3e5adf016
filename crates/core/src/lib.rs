//! EduSync client core: session types, credential persistence and route guarding

pub mod error;
pub mod router;
pub mod store;
pub mod types;

pub use error::{AuthError, AuthResult};
pub use router::{check_access, should_redirect_on_expiry, RouteDecision};
pub use store::{CredentialStore, ExternalChangeCallback, MemoryCredentialStore};
pub use types::{Role, Session};
