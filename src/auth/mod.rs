// Authentication Module
// Session cookie, route gate, token verification and client-side auth state

pub mod cookies;
pub mod error;
pub mod forms;
pub mod gate;
pub mod identity;
pub mod provider;
pub mod routes;
pub mod session_client;
pub mod state;
pub mod verifier;

pub use cookies::SessionCookies;
pub use error::{AuthError, ProviderErrorCode};
pub use gate::{GateDecision, RouteClass, RouteGate, route_gate};
pub use identity::Identity;
pub use provider::{FirebaseIdentityClient, IdentityProvider, ProviderUser};
pub use routes::{AuthApi, create_auth_router};
pub use session_client::HttpSessionClient;
pub use state::{AuthState, AuthStateProvider, Navigator, ProfileStore, SessionEndpoint};
pub use verifier::{FirebaseTokenVerifier, TokenVerifier, VerifiedToken, check_credential};
