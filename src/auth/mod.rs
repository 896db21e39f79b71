pub mod activity;
pub mod credentials;
pub mod middleware;
pub mod pipeline;
pub mod token;

pub use activity::{ActivityObserver, ActivityTracker, LoginObserver};
pub use credentials::{BcryptHasher, CredentialStore, PasswordHasher};
pub use pipeline::{Observer, ObserverChain, Pipeline};
pub use token::{TokenError, TokenService};
