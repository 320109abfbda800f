//! Shared-token auth module
//!
//! Compares a bearer token carried in the call property bag against a
//! configured secret. Plain string comparison by design; cryptographic
//! strength is out of scope for the baseline modules.

use std::collections::BTreeMap;

use maf_domain::error::Result;
use maf_domain::exchange::{MessageExchange, TOKEN_PROPERTY};
use maf_domain::ports::AuthModule;
use maf_domain::status::{AuthStatus, MessagePolicy, MessageType, Subject};

use maf_core::plugin::{MODULE_PLUGINS, ModulePluginEntry};

use super::split_list;

const SUPPORTED: &[MessageType] = &[MessageType::Request, MessageType::Response];

/// Module validating a token from the exchange property bag
///
/// When the token matches, the configured principal and groups are
/// established. On a mismatch or a missing token the outcome depends on the
/// request policy: mandatory authentication fails, non-mandatory passes
/// through without a principal.
#[derive(Debug)]
pub struct HeaderTokenModule {
    token: String,
    principal: Option<String>,
    groups: Vec<String>,
    mandatory: bool,
}

impl HeaderTokenModule {
    /// Create a module from its configured options
    ///
    /// Recognized options: `token` (required), `principal`, `groups`
    /// (comma-separated).
    pub fn from_options(options: &BTreeMap<String, String>) -> std::result::Result<Self, String> {
        let token = options
            .get("token")
            .cloned()
            .ok_or_else(|| "header-token module requires a 'token' option".to_string())?;
        Ok(Self {
            token,
            principal: options.get("principal").cloned(),
            groups: split_list(options, "groups"),
            mandatory: false,
        })
    }
}

impl AuthModule for HeaderTokenModule {
    fn name(&self) -> &str {
        "header-token"
    }

    fn supported_message_types(&self) -> &[MessageType] {
        SUPPORTED
    }

    fn initialize(
        &mut self,
        request_policy: Option<&MessagePolicy>,
        _response_policy: Option<&MessagePolicy>,
        _options: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.mandatory = request_policy.is_some_and(|p| p.mandatory);
        Ok(())
    }

    fn validate(
        &self,
        exchange: &mut MessageExchange,
        subject: &mut Subject,
    ) -> Result<AuthStatus> {
        let presented = exchange.properties().get(TOKEN_PROPERTY);
        if presented.is_some_and(|t| *t == self.token) {
            subject.principal = self.principal.clone();
            subject.groups = self.groups.clone();
            return Ok(AuthStatus::Success);
        }
        if self.mandatory {
            Ok(AuthStatus::Failure)
        } else {
            Ok(AuthStatus::Success)
        }
    }
}

#[linkme::distributed_slice(MODULE_PLUGINS)]
static HEADER_TOKEN_MODULE: ModulePluginEntry = ModulePluginEntry {
    name: "header-token",
    description: "Validates a shared token carried in the call property bag",
    factory: |options| {
        HeaderTokenModule::from_options(options).map(|m| Box::new(m) as Box<dyn AuthModule>)
    },
};
