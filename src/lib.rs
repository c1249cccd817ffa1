// crossacct - per-account AWS credential resolution

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod profile;
pub mod resolver;
pub mod sso;

pub use error::{ResolveError, Result};
pub use models::{AccountMapping, CachedCredential, Credentials, StrategyDescriptor};
pub use resolver::{can_provide, CredentialResolver};
