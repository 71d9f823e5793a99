//! Normalizing loosely-typed configuration objects into structured form.

use log::debug;
use serde_json::{Map, Value};

use crate::{
    config::{ConnectionConfig, HostAddress},
    error::{ErrorKind, Result},
    options::RawValue,
    parse, util, validate,
};

/// Normalizes a loosely-typed configuration value (e.g. deserialized from an
/// environment-driven config file) into a [`ConnectionConfig`].
///
/// The input must be a JSON object; `null` or any other value is rejected.
/// The result is validated before it is returned, failing on the first
/// invariant violation.
pub fn normalize(config_obj: &Value) -> Result<ConnectionConfig> {
    let obj = match config_obj {
        Value::Object(map) => map,
        _ => return Err(ErrorKind::ConfigObjNotDefined.into()),
    };

    let mut config = ConnectionConfig::default();

    if let Some(protocol) = obj.get("protocol") {
        let raw = protocol
            .as_str()
            .ok_or(ErrorKind::ConfigHasUnknownProtocol)?;
        config.protocol = raw.parse()?;
    }

    if let Some(host_value) = obj.get("host") {
        if let Some(host) = normalize_host(host_value, obj.get("port"))? {
            config.host = Some(host);
        }
    }

    if let Some(username) = first_string(obj, &["username", "user", "uid"]) {
        config.username = Some(username);
    }

    if let Some(password) = obj.get("password").and_then(Value::as_str) {
        config.password = Some(password.to_string());
    }

    if let Some(database) = obj.get("database").and_then(Value::as_str) {
        config.database = Some(database.to_string());
    }

    if let Some(Value::Array(entries)) = obj.get("replicaSet") {
        let mut members = Vec::new();
        for entry in entries {
            if let Some(member) = normalize_host(entry, None)? {
                members.push(member);
            }
        }
        config.replica_set = members;
    }

    if let Some(Value::Object(options)) = obj.get("options") {
        for (key, value) in options {
            config.options.apply(key, RawValue::Typed(value))?;
        }
    }

    validate::validate(&config)?;

    debug!(
        "normalized configuration object: host={:?}, {} replica member(s)",
        config.host.as_ref().map(|host| host.name.as_str()),
        config.replica_set.len()
    );

    Ok(config)
}

/// Normalizes one host-shaped value: a bare `name[:port]` string is handed to
/// the host-list parser; an object contributes a name under any of `host`,
/// `name`, or `address` plus an optional numeric-or-numeric-string port. A
/// missing or unusable value yields `None` so callers can filter it out.
fn normalize_host(host_value: &Value, port_value: Option<&Value>) -> Result<Option<HostAddress>> {
    match host_value {
        Value::String(address) if address.contains(':') => {
            Ok(parse::parse_host_list(address)?.into_iter().next())
        }
        Value::String(name) => {
            let mut host = HostAddress::default();
            if !name.trim().is_empty() {
                host.name = name.clone();
            }
            apply_port(&mut host, port_value)?;
            Ok(Some(host))
        }
        Value::Object(map) => {
            let mut host = HostAddress::default();
            if let Some(name) = first_string(map, &["host", "name", "address"]) {
                if !name.trim().is_empty() {
                    host.name = name;
                }
            }
            apply_port(&mut host, map.get("port").or(port_value))?;
            Ok(Some(host))
        }
        _ => Ok(None),
    }
}

/// Applies a loosely-typed port value. A non-numeric string is ignored
/// (leaving the default), but a numeric-looking value that cannot be
/// converted to a port number is an error.
fn apply_port(host: &mut HostAddress, port_value: Option<&Value>) -> Result<()> {
    match port_value {
        None | Some(Value::Null) => {}
        Some(Value::Number(number)) => {
            let port = number
                .as_u64()
                .and_then(|port| u16::try_from(port).ok())
                .ok_or(ErrorKind::ConfigObjPortNotNumeric)?;
            host.port = Some(port);
        }
        Some(Value::String(text)) => {
            if util::is_numeric(text) {
                let port = text
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| ErrorKind::ConfigObjPortNotNumeric)?;
                host.port = Some(port);
            }
        }
        Some(_) => {}
    }

    Ok(())
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::config::Scheme;

    fn fixture() -> Value {
        json!({
            "protocol": "mongodb",
            "host": "localhost",
            "port": "27017",
            "user": "admin",
            "password": "Password",
            "database": "adonis",
            "replicaSet": [
                { "host": "db0.example.com", "port": "27017" },
                { "name": "db1.example.com", "port": "27018" },
                "db2.example.com:27019",
                { "address": "db3.example.com", "port": 27020 },
            ],
            "options": {
                "ssl": true,
                "authSource": "admin",
                "tlsInsecure": true,
            },
        })
    }

    #[test]
    fn rejects_null_and_non_object_input() {
        for value in [json!(null), json!("mongodb://localhost"), json!(42)] {
            let error = normalize(&value).unwrap_err();
            assert!(error.is_kind(&ErrorKind::ConfigObjNotDefined));
        }
    }

    #[test]
    fn maps_the_basic_fields() {
        let config = normalize(&fixture()).unwrap();
        assert_eq!(config.name, "Default");
        assert_eq!(config.protocol, Scheme::Mongodb);
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(config.password.as_deref(), Some("Password"));
        assert_eq!(config.database.as_deref(), Some("adonis"));
        assert_eq!(config.host, Some(HostAddress::new("localhost", 27017)));
    }

    #[test]
    fn username_aliases_are_preferred_in_order() {
        let config =
            normalize(&json!({ "user": "second", "uid": "third", "password": "p" })).unwrap();
        assert_eq!(config.username.as_deref(), Some("second"));

        let config =
            normalize(&json!({ "username": "first", "user": "second", "password": "p" })).unwrap();
        assert_eq!(config.username.as_deref(), Some("first"));
    }

    #[test]
    fn replica_set_entries_accept_all_shapes() {
        let config = normalize(&fixture()).unwrap();
        assert_eq!(
            config.replica_set,
            vec![
                HostAddress::new("db0.example.com", 27017),
                HostAddress::new("db1.example.com", 27018),
                HostAddress::new("db2.example.com", 27019),
                HostAddress::new("db3.example.com", 27020),
            ]
        );
    }

    #[test]
    fn options_go_through_the_dispatch_table_with_typed_values() {
        let config = normalize(&fixture()).unwrap();
        let security = config.options.security.as_ref().unwrap();
        assert_eq!(security.tls, Some(true));
        assert_eq!(security.tls_insecure, Some(true));
        assert_eq!(config.options.auth_source.as_deref(), Some("admin"));
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let error = normalize(&json!({ "protocol": "postgres" })).unwrap_err();
        assert!(error.is_kind(&ErrorKind::ConfigHasUnknownProtocol));
    }

    #[test]
    fn non_numeric_port_string_is_ignored() {
        let config = normalize(&json!({ "host": "example.com", "port": "default" })).unwrap();
        assert_eq!(config.host, Some(HostAddress::new("example.com", 27017)));
    }

    #[test]
    fn numeric_looking_but_unconvertible_port_is_an_error() {
        let error = normalize(&json!({ "host": "example.com", "port": "27017.5" })).unwrap_err();
        assert!(error.is_kind(&ErrorKind::ConfigObjPortNotNumeric));
    }

    #[test]
    fn out_of_range_port_number_is_an_error() {
        let error = normalize(&json!({ "host": "example.com", "port": 70000 })).unwrap_err();
        assert!(error.is_kind(&ErrorKind::ConfigObjPortNotNumeric));
    }

    #[test]
    fn null_replica_entries_are_filtered_out() {
        let config = normalize(&json!({
            "replicaSet": [null, "db0.example.com:27018"],
        }))
        .unwrap();
        assert_eq!(
            config.replica_set,
            vec![HostAddress::new("db0.example.com", 27018)]
        );
    }

    #[test]
    fn unknown_option_keys_are_rejected() {
        let error = normalize(&json!({
            "options": { "bogusOption": 1 },
        }))
        .unwrap_err();
        match error.kind.as_ref() {
            ErrorKind::UnrecognizedOption { key, .. } => assert_eq!(key, "bogusOption"),
            other => panic!("unexpected error kind: {:?}", other),
        }
    }

    #[test]
    fn the_result_is_validated() {
        let error = normalize(&json!({ "username": "lonely" })).unwrap_err();
        assert!(error.is_kind(&ErrorKind::ConfigMustHaveBothUserAndPassword));
    }
}
