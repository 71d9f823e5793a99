//! The structured connection configuration and its supporting types.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{
    de::{Error as DeError, Unexpected},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_with::skip_serializing_none;
use typed_builder::TypedBuilder;

use crate::{
    error::{Error, ErrorKind, Result},
    options::ConnectionOptions,
    util,
};

/// The well-known default MongoDB port, used whenever a host's port is
/// unspecified.
pub const DEFAULT_PORT: u16 = 27017;

/// The default host name for a fresh configuration.
pub const DEFAULT_HOST: &str = "localhost";

pub(crate) const DEFAULT_CONFIG_NAME: &str = "Default";

/// A hostname:port address pair.
#[derive(Clone, Debug, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct HostAddress {
    /// The DNS name or IP address of the server.
    #[builder(setter(into))]
    pub name: String,

    /// The port to connect on.
    ///
    /// The default is 27017.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl HostAddress {
    /// Creates a host address from a name and an optional port.
    pub fn new(name: impl Into<String>, port: impl Into<Option<u16>>) -> Self {
        Self {
            name: name.into(),
            port: port.into(),
        }
    }

    /// Parses a `name[:port]` string into a `HostAddress`.
    pub fn parse(address: &str) -> Result<Self> {
        let mut parts = address.split(':');

        let name = match parts.next() {
            Some(part) => part,
            None => return Err(ErrorKind::HostInvalid.into()),
        };

        let port = match parts.next() {
            Some(part) => {
                let port = u16::from_str(part).map_err(|_| ErrorKind::HostPortNotANumber)?;

                if parts.next().is_some() {
                    return Err(ErrorKind::HostInvalid.into());
                }

                Some(port)
            }
            None => None,
        };

        Ok(Self {
            name: name.to_string(),
            port,
        })
    }
}

impl Default for HostAddress {
    fn default() -> Self {
        Self {
            name: DEFAULT_HOST.to_string(),
            port: Some(DEFAULT_PORT),
        }
    }
}

impl PartialEq for HostAddress {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.port.unwrap_or(DEFAULT_PORT) == other.port.unwrap_or(DEFAULT_PORT)
    }
}

impl Hash for HostAddress {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.name.hash(state);
        self.port.unwrap_or(DEFAULT_PORT).hash(state);
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}:{}", self.name, self.port.unwrap_or(DEFAULT_PORT))
    }
}

/// The connection-string schemes recognized by this crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// The standard `mongodb` scheme.
    #[default]
    Mongodb,

    /// The DNS seed list `mongodb+srv` scheme.
    MongodbSrv,
}

impl Scheme {
    /// Gets the string representation of the scheme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Mongodb => "mongodb",
            Scheme::MongodbSrv => "mongodb+srv",
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mongodb" => Ok(Scheme::Mongodb),
            "mongodb+srv" => Ok(Scheme::MongodbSrv),
            _ => Err(ErrorKind::ConfigHasUnknownProtocol.into()),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl Serialize for Scheme {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Scheme {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        Scheme::from_str(&s)
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&s), &"a MongoDB connection scheme"))
    }
}

/// A structured connection configuration: the common form produced by the
/// parser and the normalizer and consumed by the builder.
///
/// Exactly one of `host` or a non-empty `replica_set` is meaningful when the
/// configuration is rendered to a URI.
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    /// The name of this connection configuration.
    #[builder(default = DEFAULT_CONFIG_NAME.to_string(), setter(into))]
    pub name: String,

    /// The host address of a single-server deployment.
    #[builder(default = Some(HostAddress::default()), setter(strip_option))]
    pub host: Option<HostAddress>,

    /// The user name to authenticate with.
    #[builder(default, setter(strip_option, into))]
    pub username: Option<String>,

    /// The password to authenticate with.
    #[builder(default, setter(strip_option, into))]
    pub password: Option<String>,

    /// The default database.
    #[builder(default, setter(strip_option, into))]
    pub database: Option<String>,

    /// The connection-string scheme.
    #[builder(default)]
    pub protocol: Scheme,

    /// The host addresses of a replica-set deployment, mutually exclusive
    /// with `host`.
    #[builder(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replica_set: Vec<HostAddress>,

    /// The connection options rendered into the URI query string.
    #[builder(default)]
    pub options: ConnectionOptions,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConnectionConfig {
    /// Parses a MongoDB connection string into a `ConnectionConfig`.
    ///
    /// Equivalent to [`parse_uri`](crate::parse_uri); parsing does not run
    /// the validator.
    pub fn parse(uri: &str) -> Result<Self> {
        crate::parse::parse_uri(uri)
    }

    /// Validates this configuration, failing on the first violation found.
    pub fn validate(&self) -> Result<()> {
        crate::validate::validate(self)
    }

    /// Validates this configuration, collecting every violation found.
    pub fn check(&self) -> crate::validate::ValidationResult {
        crate::validate::check(self)
    }

    pub(crate) fn has_username_or_password(&self) -> bool {
        !util::is_blank(self.username.as_deref()) || !util::is_blank(self.password.as_deref())
    }
}

impl FromStr for ConnectionConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::parse::parse_uri(s)
    }
}
