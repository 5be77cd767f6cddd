/// Auth State Provider
///
/// Tracks the signed-in identity for one client. `login`, `register` and
/// `logout` are serialized by a single-flight lock; passive updates from the
/// identity provider's auth-state stream take the same lock, so a slow login
/// can never overwrite a later logout.
use crate::auth::error::AuthError;
use crate::auth::gate::LOGIN_PATH;
use crate::auth::identity::{Identity, ProfileRegistration};
use crate::auth::provider::{IdentityProvider, ProviderUser};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Backend user profiles keyed by provider uid
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, uid: &str) -> Result<Identity, AuthError>;

    async fn register_profile(&self, registration: ProfileRegistration) -> Result<(), AuthError>;
}

/// The app's session endpoint (sets/clears the session cookie)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionEndpoint: Send + Sync {
    async fn set_session(&self, credential: &str) -> Result<(), AuthError>;

    async fn clear_session(&self) -> Result<(), AuthError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<Identity>,
    /// True until the first auth-state event, and while logging out
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

pub struct AuthStateProvider {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    session: Arc<dyn SessionEndpoint>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<AuthState>,
    ops: Mutex<()>,
}

impl AuthStateProvider {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        session: Arc<dyn SessionEndpoint>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            identity,
            profiles,
            session,
            navigator,
            state,
            ops: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Sign in, write the session cookie and publish the resolved identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let _guard = self.ops.lock().await;

        let user = self.identity.sign_in(email, password).await?;
        self.session.set_session(&user.id_token).await?;

        let identity = self.resolve(&user).await;
        self.publish(Some(identity.clone()));
        info!(uid = %identity.uid, "logged in");
        Ok(identity)
    }

    /// Create the account and its backend profile, then sign the user in.
    ///
    /// A failure after the provider account exists leaves that account in place.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let _guard = self.ops.lock().await;

        let user = self.identity.create_user(email, password).await?;

        self.profiles
            .register_profile(ProfileRegistration {
                token: user.id_token.clone(),
                uid: user.uid.clone(),
                name: name.unwrap_or_default().to_string(),
                email: email.to_string(),
            })
            .await?;

        self.session.set_session(&user.id_token).await?;

        let identity = self.resolve(&user).await;
        self.publish(Some(identity.clone()));
        info!(uid = %identity.uid, "registered");
        Ok(identity)
    }

    /// Clear the cookie, sign out and go to the login page.
    ///
    /// State is cleared and navigation happens even if a step fails; the
    /// first failure is returned.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _guard = self.ops.lock().await;
        self.state.send_modify(|s| s.loading = true);

        let cookie_res = self.session.clear_session().await;
        if let Err(e) = &cookie_res {
            warn!("failed to clear session cookie: {}", e);
        }

        let sign_out_res = self.identity.sign_out().await;
        if let Err(e) = &sign_out_res {
            warn!("provider sign-out failed: {}", e);
        }

        self.publish(None);
        self.navigator.navigate(LOGIN_PATH);
        info!("logged out");

        cookie_res.and(sign_out_res)
    }

    /// Follow the provider's auth-state stream.
    ///
    /// The task holds only a weak reference: it ends when the stream closes,
    /// or at the first event after this provider has been dropped.
    pub fn start_tracking(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let mut rx = self.identity.subscribe();

        tokio::spawn(async move {
            loop {
                let Some(this) = weak.upgrade() else {
                    debug!("auth state provider dropped, tracking stopped");
                    break;
                };
                this.sync_with(&mut rx).await;
                drop(this);

                if rx.changed().await.is_err() {
                    debug!("auth-state stream closed");
                    break;
                }
            }
        })
    }

    async fn sync_with(&self, rx: &mut watch::Receiver<Option<ProviderUser>>) {
        let _guard = self.ops.lock().await;
        // Latest value at the time we hold the lock, not the one that woke us
        let user = rx.borrow_and_update().clone();

        let Some(user) = user else {
            self.publish(None);
            return;
        };

        // A placeholder is retried on every event until the profile resolves
        let already_known = self
            .state
            .borrow()
            .user
            .as_ref()
            .is_some_and(|current| current.uid == user.uid && !current.is_placeholder());

        if already_known {
            self.state.send_modify(|s| s.loading = false);
        } else {
            let identity = self.resolve(&user).await;
            self.publish(Some(identity));
        }
    }

    /// Backend profile for `user`, or the placeholder if it cannot be fetched
    async fn resolve(&self, user: &ProviderUser) -> Identity {
        match self.profiles.fetch_profile(&user.uid).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(uid = %user.uid, "using placeholder identity: {}", e);
                Identity::placeholder(user.uid.clone(), user.email.clone())
            }
        }
    }

    fn publish(&self, user: Option<Identity>) {
        self.state.send_replace(AuthState {
            user,
            loading: false,
        });
    }
}
