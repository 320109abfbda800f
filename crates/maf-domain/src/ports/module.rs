//! Auth module port

use std::collections::BTreeMap;

use crate::error::Result;
use crate::exchange::MessageExchange;
use crate::status::{AuthStatus, MessagePolicy, MessageType, Subject};

/// One pluggable authentication module
///
/// Modules are initialized exactly once with their merged options and the
/// request/response policies, then invoked concurrently from multiple request
/// threads; implementations must be reentrant after initialization.
pub trait AuthModule: Send + Sync {
    /// Stable module name, matching its plugin registration
    fn name(&self) -> &str;

    /// Message types this module knows how to process
    ///
    /// Must be a superset of every policy's required types; the chain builder
    /// raises a configuration error otherwise.
    fn supported_message_types(&self) -> &[MessageType];

    /// Initialize the module with its policies and merged options
    ///
    /// Options merge caller-supplied per-call properties under statically
    /// configured per-module options; configured options win on collision.
    fn initialize(
        &mut self,
        request_policy: Option<&MessagePolicy>,
        response_policy: Option<&MessagePolicy>,
        options: &BTreeMap<String, String>,
    ) -> Result<()>;

    /// Validate the inbound request and establish the caller identity
    fn validate(&self, exchange: &mut MessageExchange, subject: &mut Subject)
    -> Result<AuthStatus>;

    /// Secure the outbound response
    fn secure(&self, _exchange: &mut MessageExchange, _subject: &Subject) -> Result<AuthStatus> {
        Ok(AuthStatus::SendSuccess)
    }

    /// Release any per-call state attached to the exchange or subject
    fn clean(&self, _exchange: &mut MessageExchange, subject: &mut Subject) -> Result<()> {
        subject.clear();
        Ok(())
    }
}

impl std::fmt::Debug for dyn AuthModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthModule").field("name", &self.name()).finish()
    }
}
