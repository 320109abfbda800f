//! Registry listener port

use crate::error::Result;

/// Callback notified when a registration within its subscribed scope changes
///
/// A listener subscribed at key R fires for changes at any key R implies.
/// Notification always happens after the registry's mutating lock has been
/// released, so listeners may re-enter the registry (e.g. to look up the new
/// provider and re-subscribe). A listener error is logged and does not stop
/// delivery to the remaining listeners in the same cycle.
pub trait RegistryListener: Send + Sync {
    /// Called with the layer and app context of the changed registration
    fn notify(&self, layer: Option<&str>, app_context: Option<&str>) -> Result<()>;
}
