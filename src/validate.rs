//! Structural validation of connection configurations.

use crate::{
    config::{ConnectionConfig, HostAddress},
    error::{Error, ErrorKind, Result},
    util,
};

/// The outcome of [`check`]ing a configuration: whether it is valid, and
/// every violation found, in check order.
#[derive(Clone, Debug)]
pub struct ValidationResult {
    /// Whether the configuration passed every check.
    pub is_valid: bool,

    /// The violations found; empty when `is_valid` is true.
    pub errors: Vec<Error>,
}

/// Validates `config`, collecting every violation rather than stopping at
/// the first.
pub fn check(config: &ConnectionConfig) -> ValidationResult {
    let errors = collect_violations(config);

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Validates `config`, failing with the first violation found (in the same
/// order [`check`] reports them).
pub fn validate(config: &ConnectionConfig) -> Result<()> {
    match collect_violations(config).into_iter().next() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn collect_violations(config: &ConnectionConfig) -> Vec<Error> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ErrorKind::ConfigHasNoName.into());
    }

    // The protocol is a closed enum, so the "missing protocol" and "unknown
    // protocol" defects cannot occur on a structured config; the normalizer
    // raises them for loose input.

    if config.replica_set.is_empty() {
        match &config.host {
            Some(host) => check_host(host, &mut errors),
            None => errors.push(ErrorKind::ConfigHasNoHost.into()),
        }
    } else {
        for member in &config.replica_set {
            check_host(member, &mut errors);
        }
    }

    if config.has_username_or_password()
        && (util::is_blank(config.username.as_deref()) || util::is_blank(config.password.as_deref()))
    {
        errors.push(ErrorKind::ConfigMustHaveBothUserAndPassword.into());
    }

    errors
}

fn check_host(host: &HostAddress, errors: &mut Vec<Error>) {
    if host.name.trim().is_empty() {
        errors.push(ErrorKind::ConfigHasNoHostName.into());
    }

    if host.port.unwrap_or(0) == 0 {
        errors.push(ErrorKind::ConfigHasNoHostPort.into());
    }
}
