//! Per-call message exchange
//!
//! The host-runtime adapter hands the facility one exchange per inbound call:
//! an opaque request/response pair that is passed through to modules
//! unmodified, plus a mutable string-keyed property bag that survives the
//! life of the call and carries hints such as the mandatory-authentication
//! flag.

use std::any::Any;
use std::collections::BTreeMap;

/// Property bag key marking authentication as mandatory for this call
pub const MANDATORY_PROPERTY: &str = "maf.policy.mandatory";

/// Property bag key carrying a bearer token supplied by the host adapter
pub const TOKEN_PROPERTY: &str = "maf.auth.token";

/// Property bag key hinting that the established identity should be
/// registered with the host session
pub const REGISTER_SESSION_PROPERTY: &str = "maf.session.register";

/// One inbound call's worth of messages and call-scoped properties
///
/// The request and response are opaque to the facility; modules downcast to
/// the concrete types agreed with the host adapter.
#[derive(Default)]
pub struct MessageExchange {
    request: Option<Box<dyn Any + Send>>,
    response: Option<Box<dyn Any + Send>>,
    properties: BTreeMap<String, String>,
}

impl MessageExchange {
    /// Create an empty exchange
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the request message
    pub fn with_request<T: Any + Send>(mut self, request: T) -> Self {
        self.request = Some(Box::new(request));
        self
    }

    /// Attach the response message
    pub fn with_response<T: Any + Send>(mut self, response: T) -> Self {
        self.response = Some(Box::new(response));
        self
    }

    /// Borrow the request message downcast to `T`
    pub fn request<T: Any>(&self) -> Option<&T> {
        self.request.as_deref().and_then(|r| r.downcast_ref())
    }

    /// Mutably borrow the request message downcast to `T`
    pub fn request_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.request.as_deref_mut().and_then(|r| r.downcast_mut())
    }

    /// Borrow the response message downcast to `T`
    pub fn response<T: Any>(&self) -> Option<&T> {
        self.response.as_deref().and_then(|r| r.downcast_ref())
    }

    /// Mutably borrow the response message downcast to `T`
    pub fn response_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.response.as_deref_mut().and_then(|r| r.downcast_mut())
    }

    /// Replace the response message
    pub fn set_response<T: Any + Send>(&mut self, response: T) {
        self.response = Some(Box::new(response));
    }

    /// The call-scoped property bag
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Mutable access to the call-scoped property bag
    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.properties
    }

    /// Whether the mandatory-authentication flag is set
    pub fn is_mandatory(&self) -> bool {
        self.properties
            .get(MANDATORY_PROPERTY)
            .is_some_and(|v| v == "true")
    }

    /// Set or clear the mandatory-authentication flag
    pub fn set_mandatory(&mut self, mandatory: bool) {
        if mandatory {
            self.properties
                .insert(MANDATORY_PROPERTY.to_string(), "true".to_string());
        } else {
            self.properties.remove(MANDATORY_PROPERTY);
        }
    }
}

impl std::fmt::Debug for MessageExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageExchange")
            .field("has_request", &self.request.is_some())
            .field("has_response", &self.response.is_some())
            .field("properties", &self.properties)
            .finish()
    }
}
