//! Provider, auth-config, and auth-context ports

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::exchange::MessageExchange;
use crate::status::{AuthStatus, Subject};

/// Role an auth config serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigRole {
    /// Securing outbound requests and validating their responses
    Client,
    /// Validating inbound requests and securing their responses
    Server,
}

/// Factory for auth configs, bound to the registry per (layer, app context)
///
/// A provider owns an epoch counter; `refresh` advances it, which lazily
/// invalidates every auth-context cache derived from this provider.
pub trait AuthProvider: Send + Sync {
    /// Obtain the auth config for a role and scope
    fn auth_config(
        &self,
        role: ConfigRole,
        layer: Option<&str>,
        app_context: Option<&str>,
    ) -> Result<Arc<dyn AuthConfig>>;

    /// Advance the epoch, invalidating dependent context caches
    fn refresh(&self);

    /// Current epoch value
    fn epoch(&self) -> u64;
}

/// Cache of runnable auth contexts for one provider/role/scope triple
pub trait AuthConfig: Send + Sync {
    /// Role this config serves
    fn role(&self) -> ConfigRole;

    /// Layer this config is scoped to, if any
    fn layer(&self) -> Option<&str>;

    /// Application context this config is scoped to, if any
    fn app_context(&self) -> Option<&str>;

    /// Resolve the auth context for one context id
    ///
    /// Returns `Ok(None)` when no module stack is configured for the id, in
    /// which case callers treat the scope as unprotected for that id.
    /// Contexts are cached per (context id, properties identity) and rebuilt
    /// when the owning provider's epoch advances.
    fn context(
        &self,
        context_id: &str,
        properties: Option<&BTreeMap<String, String>>,
    ) -> Result<Option<Arc<dyn AuthContext>>>;
}

/// The instantiated, ready-to-run module stack for one context id
///
/// Immutable once built; safe to invoke concurrently from multiple request
/// threads sharing the context.
pub trait AuthContext: Send + Sync {
    /// Run the stack's validate operation and fold the outcomes
    fn validate(&self, exchange: &mut MessageExchange, subject: &mut Subject)
    -> Result<AuthStatus>;

    /// Run the stack's secure operation and fold the outcomes
    fn secure(&self, exchange: &mut MessageExchange, subject: &Subject) -> Result<AuthStatus>;

    /// Run every module's clean operation
    fn clean(&self, exchange: &mut MessageExchange, subject: &mut Subject) -> Result<()>;
}
