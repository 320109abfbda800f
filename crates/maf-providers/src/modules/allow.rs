//! Unconditionally successful auth module

use std::collections::BTreeMap;

use maf_domain::error::Result;
use maf_domain::exchange::MessageExchange;
use maf_domain::ports::AuthModule;
use maf_domain::status::{AuthStatus, MessagePolicy, MessageType, Subject};

use maf_core::plugin::{MODULE_PLUGINS, ModulePluginEntry};

use super::split_list;

const SUPPORTED: &[MessageType] = &[MessageType::Request, MessageType::Response];

/// Module that always reports success
///
/// Optionally establishes a configured principal and group list on the
/// subject, which makes it useful as the terminal OPTIONAL step of a stack
/// or as an unauthenticated default.
#[derive(Debug, Default)]
pub struct AllowModule {
    principal: Option<String>,
    groups: Vec<String>,
}

impl AllowModule {
    /// Create a module from its configured options
    ///
    /// Recognized options: `principal`, `groups` (comma-separated).
    pub fn from_options(options: &BTreeMap<String, String>) -> Self {
        Self {
            principal: options.get("principal").cloned(),
            groups: split_list(options, "groups"),
        }
    }
}

impl AuthModule for AllowModule {
    fn name(&self) -> &str {
        "allow"
    }

    fn supported_message_types(&self) -> &[MessageType] {
        SUPPORTED
    }

    fn initialize(
        &mut self,
        _request_policy: Option<&MessagePolicy>,
        _response_policy: Option<&MessagePolicy>,
        options: &BTreeMap<String, String>,
    ) -> Result<()> {
        if self.principal.is_none() {
            self.principal = options.get("principal").cloned();
        }
        if self.groups.is_empty() {
            self.groups = split_list(options, "groups");
        }
        Ok(())
    }

    fn validate(
        &self,
        _exchange: &mut MessageExchange,
        subject: &mut Subject,
    ) -> Result<AuthStatus> {
        if let Some(principal) = &self.principal {
            subject.principal = Some(principal.clone());
            subject.groups = self.groups.clone();
        }
        Ok(AuthStatus::Success)
    }
}

#[linkme::distributed_slice(MODULE_PLUGINS)]
static ALLOW_MODULE: ModulePluginEntry = ModulePluginEntry {
    name: "allow",
    description: "Unconditionally successful module, optionally establishing a fixed principal",
    factory: |options| Ok(Box::new(AllowModule::from_options(options)) as Box<dyn AuthModule>),
};
