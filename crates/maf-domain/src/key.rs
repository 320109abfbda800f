//! Registration key codec
//!
//! A registration key scopes a provider binding to an optional message layer
//! and an optional application context. The encoded form doubles as the
//! stable registration id handed out by the registry, so the encoding must be
//! losslessly reversible: `None` and `""` stay distinct, and values may
//! contain any character, including the separator used by the codec itself.
//!
//! Encoding scheme (one class digit, then the payload):
//!
//! ```text
//! 0                     neither layer nor app context
//! 1<app>                app context only
//! 2<layer>              layer only
//! 3<len>_<layer><app>   both, layer segment length-prefixed in bytes
//! ```

use crate::error::{Error, Result};

/// Specificity key for one provider binding
///
/// Four classes exist, ordered most-to-least specific:
/// `(layer, app)` > `(None, app)` > `(layer, None)` > `(None, None)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationKey {
    layer: Option<String>,
    app_context: Option<String>,
}

impl RegistrationKey {
    /// Create a key from an optional layer and app context
    pub fn new(layer: Option<&str>, app_context: Option<&str>) -> Self {
        Self {
            layer: layer.map(str::to_owned),
            app_context: app_context.map(str::to_owned),
        }
    }

    /// The layer this key is scoped to, if any
    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    /// The application context this key is scoped to, if any
    pub fn app_context(&self) -> Option<&str> {
        self.app_context.as_deref()
    }

    /// Encode the key into its stable registration id form
    pub fn encode(&self) -> String {
        match (&self.layer, &self.app_context) {
            (None, None) => "0".to_string(),
            (None, Some(app)) => format!("1{app}"),
            (Some(layer), None) => format!("2{layer}"),
            (Some(layer), Some(app)) => format!("3{}_{layer}{app}", layer.len()),
        }
    }

    /// Decode a registration id back into a key
    ///
    /// Fails with [`Error::InvalidKey`] on anything the encoder could not
    /// have produced, which signals corrupted persisted state.
    pub fn decode(id: &str) -> Result<Self> {
        let Some(class) = id.chars().next() else {
            return Err(Error::invalid_key("empty registration id"));
        };
        let rest = &id[class.len_utf8()..];
        match class {
            '0' => {
                if rest.is_empty() {
                    Ok(Self::new(None, None))
                } else {
                    Err(Error::invalid_key(format!(
                        "trailing data after class 0: {id:?}"
                    )))
                }
            }
            '1' => Ok(Self::new(None, Some(rest))),
            '2' => Ok(Self::new(Some(rest), None)),
            '3' => {
                let Some((len, payload)) = rest.split_once('_') else {
                    return Err(Error::invalid_key(format!(
                        "class 3 id without length prefix: {id:?}"
                    )));
                };
                let len: usize = len.parse().map_err(|_| {
                    Error::invalid_key(format!("non-numeric length prefix: {id:?}"))
                })?;
                let (Some(layer), Some(app)) = (payload.get(..len), payload.get(len..)) else {
                    return Err(Error::invalid_key(format!(
                        "length prefix out of bounds: {id:?}"
                    )));
                };
                Ok(Self::new(Some(layer), Some(app)))
            }
            other => Err(Error::invalid_key(format!(
                "unknown key class {other:?} in {id:?}"
            ))),
        }
    }

    /// True iff a binding at `self` covers a lookup at `other`
    ///
    /// Partial order: a `None` field matches anything, so `(None, None)` is
    /// the top element. A listener subscribed at key R is notified for every
    /// change at a key that R implies.
    pub fn implies(&self, other: &RegistrationKey) -> bool {
        (self.layer.is_none() || self.layer == other.layer)
            && (self.app_context.is_none() || self.app_context == other.app_context)
    }

    /// Keys to probe for a lookup, most specific first
    pub fn precedence(layer: Option<&str>, app_context: Option<&str>) -> [RegistrationKey; 4] {
        [
            RegistrationKey::new(layer, app_context),
            RegistrationKey::new(None, app_context),
            RegistrationKey::new(layer, None),
            RegistrationKey::new(None, None),
        ]
    }
}

impl std::fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})",
            self.layer.as_deref().unwrap_or("<any>"),
            self.app_context.as_deref().unwrap_or("<any>")
        )
    }
}
