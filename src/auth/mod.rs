mod credential;
mod error;
mod gateway;
mod identity;
mod normalize;
mod plugin;
pub mod wire;

pub use credential::{Credential, Flow, LoginRequest};
pub use error::AuthError;
pub use gateway::PassportGateway;
pub use identity::{CanonicalIdentity, apply_profile_defaults};
pub use normalize::{ResponseFlow, normalize};
pub use plugin::{Authenticator, PassportAuthenticator};
