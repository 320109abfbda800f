//! Module-chain executor
//!
//! Resolves an ordered stack of auth modules for one context id and folds
//! their individual outcomes into a single status under PAM-style control
//! flags. A module that fails to load leaves an absent step behind: it is
//! logged, skipped during invocation, and excluded from flag evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use maf_domain::error::{Error, Result};
use maf_domain::exchange::MessageExchange;
use maf_domain::ports::{AuthContext, AuthModule};
use maf_domain::status::{AuthStatus, ControlFlag, MessagePolicy, Subject};

use crate::plugin;

/// Statuses counted as success when folding a validate pass
pub const VALIDATE_ACCEPTED: &[AuthStatus] = &[AuthStatus::Success];

/// Statuses counted as success when folding a secure pass
pub const SECURE_ACCEPTED: &[AuthStatus] = &[AuthStatus::SendSuccess];

/// Configured position of one module within a stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Plugin name of the module
    pub module: String,
    /// Control flag governing how this module's outcome combines
    pub flag: ControlFlag,
    /// Statically configured per-module options
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// One resolved, initialized step of a module chain
///
/// `module` is `None` for a step whose module failed to load.
#[derive(Debug)]
pub struct ModuleStep {
    /// The initialized module, or `None` when loading failed
    pub module: Option<Box<dyn AuthModule>>,
    /// Control flag for this step
    pub flag: ControlFlag,
    /// Merged options the module was initialized with
    pub options: BTreeMap<String, String>,
}

impl ModuleStep {
    /// Create a step from an already-initialized module
    pub fn new(
        module: Option<Box<dyn AuthModule>>,
        flag: ControlFlag,
        options: BTreeMap<String, String>,
    ) -> Self {
        Self {
            module,
            flag,
            options,
        }
    }
}

/// The runnable module stack for one context id
///
/// Immutable once built; invoking it concurrently from multiple request
/// threads needs no further synchronization provided the modules themselves
/// are reentrant.
#[derive(Debug)]
pub struct ModuleChain {
    context_id: String,
    steps: Vec<ModuleStep>,
}

impl ModuleChain {
    /// Resolve and initialize a chain from configured module specs
    ///
    /// Per-step options merge `call_properties` under the spec's configured
    /// options, configured options winning on key collision. Module load
    /// failures leave absent steps; an unsupported message type or an
    /// initialization failure is a configuration error that aborts the build.
    pub fn build(
        context_id: &str,
        specs: &[ModuleSpec],
        call_properties: Option<&BTreeMap<String, String>>,
        request_policy: Option<&MessagePolicy>,
        response_policy: Option<&MessagePolicy>,
    ) -> Result<Self> {
        let mut steps = Vec::with_capacity(specs.len());
        for spec in specs {
            let mut options = call_properties.cloned().unwrap_or_default();
            options.extend(spec.options.clone());

            let module = match plugin::resolve_module(&spec.module, &spec.options) {
                Ok(mut module) => {
                    check_policy_support(module.as_ref(), request_policy)?;
                    check_policy_support(module.as_ref(), response_policy)?;
                    module.initialize(request_policy, response_policy, &options)?;
                    Some(module)
                }
                Err(message) => {
                    warn!(
                        module = spec.module.as_str(),
                        context_id, %message,
                        "auth module failed to load, step treated as absent"
                    );
                    None
                }
            };
            steps.push(ModuleStep::new(module, spec.flag, options));
        }
        debug!(
            context_id,
            steps = steps.len(),
            absent = steps.iter().filter(|s| s.module.is_none()).count(),
            "module chain built"
        );
        Ok(Self {
            context_id: context_id.to_string(),
            steps,
        })
    }

    /// Assemble a chain from pre-initialized steps
    pub fn from_steps(context_id: &str, steps: Vec<ModuleStep>) -> Self {
        Self {
            context_id: context_id.to_string(),
            steps,
        }
    }

    /// Context id this chain was built for
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// The resolved steps, in invocation order
    pub fn steps(&self) -> &[ModuleStep] {
        &self.steps
    }

    /// Run one operation over the stack and fold the outcomes
    ///
    /// `accepted` is the caller-defined success-code set and `default_fail`
    /// the status returned when no module decided the result. Invocation
    /// walks the steps strictly in order, skipping absent ones, and applies
    /// the stop rule after each call: a REQUISITE non-success stops (fail
    /// fast), a SUFFICIENT success stops (succeed fast). The final status is
    /// then computed by re-scanning the invoked prefix.
    ///
    /// A module's own error is propagated verbatim.
    pub fn run<F>(
        &self,
        accepted: &[AuthStatus],
        default_fail: AuthStatus,
        mut invoke: F,
    ) -> Result<AuthStatus>
    where
        F: FnMut(&dyn AuthModule) -> Result<AuthStatus>,
    {
        let mut invoked: Vec<(ControlFlag, AuthStatus)> = Vec::new();
        let mut stopped_on_sufficient = false;

        for step in &self.steps {
            let Some(module) = step.module.as_deref() else {
                continue;
            };
            let status = invoke(module)?;
            debug!(
                context_id = self.context_id.as_str(),
                module = module.name(),
                flag = ?step.flag,
                status = ?status,
                "module invoked"
            );
            invoked.push((step.flag, status));
            match step.flag {
                ControlFlag::Requisite if !accepted.contains(&status) => break,
                ControlFlag::Sufficient if accepted.contains(&status) => {
                    stopped_on_sufficient = true;
                    break;
                }
                _ => {}
            }
        }

        Ok(Self::fold(
            &invoked,
            stopped_on_sufficient,
            accepted,
            default_fail,
        ))
    }

    /// Fold recorded outcomes into the combined status
    fn fold(
        invoked: &[(ControlFlag, AuthStatus)],
        stopped_on_sufficient: bool,
        accepted: &[AuthStatus],
        default_fail: AuthStatus,
    ) -> AuthStatus {
        let mut provisional: Option<AuthStatus> = None;
        let stop_point = invoked.len().saturating_sub(1);

        for (index, (flag, status)) in invoked.iter().enumerate() {
            match flag {
                ControlFlag::Required | ControlFlag::Requisite => {
                    if !accepted.contains(status) {
                        return *status;
                    }
                    provisional.get_or_insert(*status);
                }
                ControlFlag::Sufficient => {
                    if stopped_on_sufficient && index == stop_point {
                        return *status;
                    }
                    // a non-stopping SUFFICIENT outcome carries no weight
                }
                ControlFlag::Optional => {
                    if accepted.contains(status) {
                        provisional.get_or_insert(*status);
                    }
                }
            }
        }

        provisional.unwrap_or(default_fail)
    }
}

impl AuthContext for ModuleChain {
    fn validate(
        &self,
        exchange: &mut MessageExchange,
        subject: &mut Subject,
    ) -> Result<AuthStatus> {
        self.run(VALIDATE_ACCEPTED, AuthStatus::Failure, |module| {
            module.validate(exchange, subject)
        })
    }

    fn secure(&self, exchange: &mut MessageExchange, subject: &Subject) -> Result<AuthStatus> {
        self.run(SECURE_ACCEPTED, AuthStatus::SendFailure, |module| {
            module.secure(exchange, subject)
        })
    }

    fn clean(&self, exchange: &mut MessageExchange, subject: &mut Subject) -> Result<()> {
        let mut first_error: Option<Error> = None;
        for step in &self.steps {
            let Some(module) = step.module.as_deref() else {
                continue;
            };
            if let Err(error) = module.clean(exchange, subject) {
                warn!(
                    context_id = self.context_id.as_str(),
                    module = module.name(),
                    %error,
                    "module clean failed"
                );
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Verify the module supports every message type the policy requires
fn check_policy_support(module: &dyn AuthModule, policy: Option<&MessagePolicy>) -> Result<()> {
    let Some(policy) = policy else {
        return Ok(());
    };
    let supported = module.supported_message_types();
    for required in &policy.required_types {
        if !supported.contains(required) {
            return Err(Error::configuration(format!(
                "auth module '{}' does not support required message type {required:?}",
                module.name()
            )));
        }
    }
    Ok(())
}
