//! Client side of UpCount: transport, identity, typed endpoints and the
//! providers that keep local state in step with the server.

pub mod api;
pub mod identity;
pub mod providers;
pub mod session;
pub mod transport;

pub use api::{Api, ClientError};
pub use identity::{AuthError, AuthSession, IdentityProvider, LocalIdentity, SignUpResult};
pub use providers::{AppProvider, AuthProvider, GoalsProvider, LogsProvider, SessionError};
pub use session::{HttpSession, IdentityCredentials, Session};
pub use transport::{Credentials, HttpTransport, Transport, TransportError};
