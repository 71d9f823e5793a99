//! Contains the `Error` and `Result` types that `mongouri` uses.

use std::sync::Arc;

/// The result type for all methods that can return an error in the `mongouri` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `mongouri` crate. The inner
/// [`ErrorKind`] is wrapped in an `Arc` to allow the errors to be cloned.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: Arc<ErrorKind>,
}

impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ErrorKind::InvalidArgument {
            message: message.into(),
        }
        .into()
    }

    /// Whether this error was caused by the given kind of defect.
    pub fn is_kind(&self, other: &ErrorKind) -> bool {
        std::mem::discriminant(self.kind.as_ref()) == std::mem::discriminant(other)
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(err: E) -> Self {
        Self {
            kind: Arc::new(err.into()),
        }
    }
}

impl std::ops::Deref for Error {
    type Target = Arc<ErrorKind>;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

/// The types of errors that can occur.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An empty or blank string was passed to the connection-string parser.
    #[error("You must supply a MongoDB connection URI")]
    EmptyUriString,

    /// The connection string does not begin with a `<scheme>://` section.
    #[error("The connection URI is malformed, it must begin with a MongoDB protocol")]
    ProtocolNotDefined,

    /// The connection string scheme is not a recognized MongoDB scheme.
    #[error("The MongoDB connection protocol was unrecognized")]
    ProtocolUnrecognized,

    /// The connection string has no host section.
    #[error("A MongoDB host must be supplied")]
    HostNotDefined,

    /// The host information was not supplied.
    #[error("The MongoDB host information was not supplied")]
    HostMissing,

    /// A host entry in the connection string could not be parsed.
    #[error("The MongoDB host information was invalid")]
    HostInvalid,

    /// The host address was not supplied.
    #[error("The MongoDB host address was not supplied")]
    HostInvalidAddress,

    /// The port of a host entry is not a valid port number.
    #[error("The supplied value for the port is not a valid number")]
    HostPortNotANumber,

    /// No configuration was supplied to the validator.
    #[error("No configuration object was supplied")]
    ConfigNotSupplied,

    /// The configuration name is blank.
    #[error("The configuration's name must be supplied")]
    ConfigHasNoName,

    /// The configuration has neither a host nor replica-set members.
    #[error("The configuration must have a host")]
    ConfigHasNoHost,

    /// A configured host has a blank name.
    #[error("The configuration host must have a name")]
    ConfigHasNoHostName,

    /// A configured host has no positive port number.
    #[error("The configuration host must have a port number set")]
    ConfigHasNoHostPort,

    /// The configuration has no protocol set.
    #[error("The configuration has no protocol set")]
    ConfigHasNoProtocol,

    /// The configuration protocol is not a recognized MongoDB scheme.
    #[error("The configuration protocol is unknown")]
    ConfigHasUnknownProtocol,

    /// Only one of the username/password pair was supplied.
    #[error("The configuration must have both user name and password if either of them is supplied")]
    ConfigMustHaveBothUserAndPassword,

    /// The value passed to the normalizer was null or not an object.
    #[error("The configuration object cannot be null or undefined")]
    ConfigObjNotDefined,

    /// A port field in a configuration object looked numeric but could not be
    /// converted to a port number.
    #[error("The port supplied is not a valid number")]
    ConfigObjPortNotNumeric,

    /// An option key is not part of the recognized option set.
    #[error("{}", unrecognized_message(.key, .suggestion))]
    #[non_exhaustive]
    UnrecognizedOption {
        /// The offending key, exactly as supplied.
        key: String,
        /// A recognized key with a similar spelling, if one exists.
        suggestion: Option<String>,
    },

    /// An option value could not be coerced to the option's type.
    #[error("An invalid argument was provided: {message}")]
    #[non_exhaustive]
    InvalidArgument {
        /// A description of the defect.
        message: String,
    },

    /// Wrapper around `serde_json::Error`.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn unrecognized_message(key: &str, suggestion: &Option<String>) -> String {
    match suggestion {
        Some(suggestion) => format!(
            "Unrecognized option: {}. An option with a similar name exists: {}",
            key, suggestion
        ),
        None => format!("Unrecognized option: {}", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_cloneable() {
        let error: Error = ErrorKind::EmptyUriString.into();
        let clone = error.clone();
        assert!(clone.is_kind(&ErrorKind::EmptyUriString));
    }

    #[test]
    fn unrecognized_option_names_the_key_verbatim() {
        let error: Error = ErrorKind::UnrecognizedOption {
            key: "PoolSizes".to_string(),
            suggestion: Some("poolsize".to_string()),
        }
        .into();
        let message = error.to_string();
        assert!(message.contains("Unrecognized option: PoolSizes"));
        assert!(message.contains("similar name exists: poolsize"));
    }

    #[test]
    fn unrecognized_option_without_suggestion() {
        let error: Error = ErrorKind::UnrecognizedOption {
            key: "frobnicate".to_string(),
            suggestion: None,
        }
        .into();
        assert_eq!(error.to_string(), "Unrecognized option: frobnicate");
    }
}
