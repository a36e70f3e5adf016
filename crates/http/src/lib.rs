//! EduSync HTTP client: authenticated requests with token lifecycle management

pub mod client;
pub mod config;
pub mod session;
pub mod types;

pub use client::api::{ApiClient, ApiRequest};
pub use client::auth::{AuthApi, AuthBackend};
pub use client::error::ClientError;
pub use client::{PublicClient, PublicClientBuilder};
pub use session::{SessionManager, SessionState};
