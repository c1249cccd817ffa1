// Credential caching and per-profile coordination
mod cache;
mod locks;

pub use cache::CredentialCache;
pub use locks::ProfileLocks;
