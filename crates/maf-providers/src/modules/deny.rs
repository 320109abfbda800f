//! Unconditionally failing auth module

use std::collections::BTreeMap;

use maf_domain::error::Result;
use maf_domain::exchange::MessageExchange;
use maf_domain::ports::AuthModule;
use maf_domain::status::{AuthStatus, MessagePolicy, MessageType, Subject};

use maf_core::plugin::{MODULE_PLUGINS, ModulePluginEntry};

const SUPPORTED: &[MessageType] = &[MessageType::Request, MessageType::Response];

/// Module that always reports failure
///
/// Placed REQUIRED at the end of a stack it turns the scope into a
/// deny-by-default policy that only a preceding SUFFICIENT success escapes.
#[derive(Debug, Default)]
pub struct DenyModule;

impl AuthModule for DenyModule {
    fn name(&self) -> &str {
        "deny"
    }

    fn supported_message_types(&self) -> &[MessageType] {
        SUPPORTED
    }

    fn initialize(
        &mut self,
        _request_policy: Option<&MessagePolicy>,
        _response_policy: Option<&MessagePolicy>,
        _options: &BTreeMap<String, String>,
    ) -> Result<()> {
        Ok(())
    }

    fn validate(
        &self,
        _exchange: &mut MessageExchange,
        _subject: &mut Subject,
    ) -> Result<AuthStatus> {
        Ok(AuthStatus::Failure)
    }

    fn secure(&self, _exchange: &mut MessageExchange, _subject: &Subject) -> Result<AuthStatus> {
        Ok(AuthStatus::SendFailure)
    }
}

#[linkme::distributed_slice(MODULE_PLUGINS)]
static DENY_MODULE: ModulePluginEntry = ModulePluginEntry {
    name: "deny",
    description: "Unconditionally failing module for deny-by-default stacks",
    factory: |_options| Ok(Box::new(DenyModule) as Box<dyn AuthModule>),
};
