//! Connection options and the option dispatch table shared by the
//! connection-string parser and the object normalizer.

use std::{fmt, str::FromStr};

use serde::{
    de::{Error as DeError, Unexpected},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;
use serde_with::skip_serializing_none;
use strsim::jaro_winkler;
use typed_builder::TypedBuilder;

use crate::{
    concern::{Acknowledgment, ReadConcernLevel, ReadPreference},
    error::{Error, ErrorKind, Result},
    util,
};

/// The lower-cased option keys recognized in a connection-string query or a
/// raw options object, including every accepted alias.
const URI_OPTIONS: &[&str] = &[
    "appname",
    "authdb",
    "authsource",
    "autoreconnect",
    "compressors",
    "connecttimeoutms",
    "defaultauthdb",
    "j",
    "journal",
    "maxidletimems",
    "maxpoolsize",
    "minpoolsize",
    "poolsize",
    "readconcernlevel",
    "readpreference",
    "reconnectinterval",
    "reconnecttries",
    "replicaset",
    "retryreads",
    "retrywrites",
    "ssl",
    "sslallowinvalidcertificates",
    "sslallowinvalidhostnames",
    "sslcafile",
    "sslcertificatekeyfile",
    "sslcertificatekeyfilepassword",
    "sslinsecure",
    "tls",
    "tlsallowinvalidcertificates",
    "tlsallowinvalidhostnames",
    "tlscafile",
    "tlscertificatekeyfile",
    "tlscertificatekeyfilepassword",
    "tlsinsecure",
    "validateoptions",
    "w",
    "waitqueuetimeoutms",
    "wtimeoutms",
    "zlibcompressionlevel",
];

/// The set of options rendered into a connection string's query section,
/// grouped the way drivers document them.
///
/// Each group is allocated lazily: a group stays `None` until one of its
/// options is set.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionOptions {
    /// The database to authenticate against, if different from the default
    /// database.
    #[builder(default, setter(strip_option, into))]
    pub auth_source: Option<String>,

    /// The name of the replica set, distinct from the member list carried on
    /// the configuration itself.
    #[builder(default, setter(strip_option, into))]
    pub replica_set: Option<String>,

    /// Whether unknown method parameters should error rather than warn.
    #[builder(default, setter(strip_option))]
    pub validate_options: Option<bool>,

    /// The application name reported to the server on connection handshakes.
    #[builder(default, setter(strip_option, into))]
    pub app_name: Option<String>,

    /// Pool sizing and timeout options.
    #[builder(default, setter(strip_option))]
    pub connections: Option<PoolOptions>,

    /// TLS options.
    #[builder(default, setter(strip_option))]
    pub security: Option<SecurityOptions>,

    /// Network compression options.
    #[builder(default, setter(strip_option))]
    pub compression: Option<CompressionOptions>,

    /// Write concern options.
    #[builder(default, setter(strip_option))]
    pub write_concerns: Option<WriteConcernOptions>,

    /// Read concern and read preference options.
    #[builder(default, setter(strip_option))]
    pub read_concern: Option<ReadConcernOptions>,
}

/// Connection-pool sizing and reconnection options.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolOptions {
    /// The size of the individual server pool.
    #[builder(default, setter(strip_option))]
    pub pool_size: Option<u32>,

    /// The maximum number of connections in the connection pool.
    #[builder(default, setter(strip_option))]
    pub max_pool_size: Option<u32>,

    /// The minimum number of connections kept in the connection pool.
    #[builder(default, setter(strip_option))]
    pub min_pool_size: Option<u32>,

    /// The maximum number of milliseconds a connection can remain idle in
    /// the pool before being closed.
    #[builder(default, setter(strip_option))]
    #[serde(rename = "maxIdleTimeMS")]
    pub max_idle_time_ms: Option<u64>,

    /// The maximum time in milliseconds a thread can wait for a connection
    /// to become available.
    #[builder(default, setter(strip_option))]
    #[serde(rename = "waitQueueTimeoutMS")]
    pub wait_queue_timeout_ms: Option<u64>,

    /// Whether to reconnect automatically to single-server deployments.
    #[builder(default, setter(strip_option))]
    pub auto_reconnect: Option<bool>,

    /// How long to wait for a connection to be established before timing
    /// out, in milliseconds.
    #[builder(default, setter(strip_option))]
    #[serde(rename = "connectTimeoutMS")]
    pub connect_timeout_ms: Option<u64>,

    /// How many times the server will attempt to reconnect.
    #[builder(default, setter(strip_option))]
    pub reconnect_tries: Option<u32>,

    /// How many milliseconds the server waits between reconnection attempts.
    #[builder(default, setter(strip_option))]
    pub reconnect_interval: Option<u64>,
}

/// TLS options.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityOptions {
    /// Enables or disables TLS for the connection. `ssl` is accepted as an
    /// alias when parsing.
    #[builder(default, setter(strip_option))]
    pub tls: Option<bool>,

    /// Relaxes certificate validation; the exact checks disabled vary by
    /// driver.
    #[builder(default, setter(strip_option))]
    pub tls_insecure: Option<bool>,

    /// Whether to connect even if the server presents an invalid
    /// certificate.
    #[builder(default, setter(strip_option))]
    pub tls_allow_invalid_certificates: Option<bool>,

    /// Whether to connect even if the hostname in the server certificate
    /// does not match the server's host.
    #[builder(default, setter(strip_option))]
    pub tls_allow_invalid_hostnames: Option<bool>,

    /// The path to a `.pem` file with the root certificate chain.
    #[builder(default, setter(strip_option, into))]
    #[serde(rename = "tlsCAFile")]
    pub tls_ca_file: Option<String>,

    /// The path to a `.pem` file with the client's certificate and key.
    #[builder(default, setter(strip_option, into))]
    pub tls_certificate_key_file: Option<String>,

    /// The password used to decrypt the client key file.
    #[builder(default, setter(strip_option, into))]
    pub tls_certificate_key_file_password: Option<String>,
}

/// Network compression options.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionOptions {
    /// The compressor to enable for traffic between the client and the
    /// server.
    #[builder(default, setter(strip_option))]
    pub compressors: Option<Compressor>,

    /// The zlib compression level, from -1 (default) through 9 (best
    /// compression).
    #[builder(default, setter(strip_option))]
    pub zlib_compression_level: Option<i32>,
}

/// Write concern options.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteConcernOptions {
    /// Requests acknowledgement that the write has propagated to a specific
    /// number or variety of servers.
    #[builder(default, setter(strip_option, into))]
    pub w: Option<Acknowledgment>,

    /// A time limit for the write concern, in milliseconds. Zero means write
    /// operations never time out.
    #[builder(default, setter(strip_option))]
    #[serde(rename = "wtimeoutMS")]
    pub wtimeout_ms: Option<u64>,

    /// Requests acknowledgement that the write has reached the on-disk
    /// journal.
    #[builder(default, setter(strip_option))]
    pub journal: Option<bool>,

    /// Enables retryable writes.
    #[builder(default, setter(strip_option))]
    pub retry_writes: Option<bool>,
}

/// Read concern and read preference options.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadConcernOptions {
    /// The level of isolation for reads.
    #[builder(default, setter(strip_option))]
    pub read_concern_level: Option<ReadConcernLevel>,

    /// Which replica-set members reads are routed to.
    #[builder(default, setter(strip_option))]
    pub read_preference: Option<ReadPreference>,

    /// Enables retryable reads.
    #[builder(default, setter(strip_option))]
    pub retry_reads: Option<bool>,
}

/// A network compressor recognized in the `compressors` option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compressor {
    /// `snappy` compression.
    Snappy,

    /// `zlib` compression.
    Zlib,

    /// `zstd` compression.
    Zstd,
}

impl Compressor {
    /// Gets the string representation of the `Compressor`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compressor::Snappy => "snappy",
            Compressor::Zlib => "zlib",
            Compressor::Zstd => "zstd",
        }
    }
}

impl FromStr for Compressor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "snappy" => Ok(Compressor::Snappy),
            "zlib" => Ok(Compressor::Zlib),
            "zstd" => Ok(Compressor::Zstd),
            other => Err(Error::invalid_argument(format!(
                "'{}' is not a valid compressor",
                other
            ))),
        }
    }
}

impl fmt::Display for Compressor {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl Serialize for Compressor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Compressor {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        Compressor::from_str(&s)
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&s), &"a compressor name"))
    }
}

/// A raw option value: either text captured from a connection-string query
/// or an already-typed value from a configuration object.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RawValue<'a> {
    /// Query-string text; string-typed options are percent-decoded.
    Text(&'a str),

    /// A typed value from a configuration object; booleans and numbers pass
    /// through without being parsed from text.
    Typed(&'a Value),
}

impl RawValue<'_> {
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Typed(Value::String(s)) => s.trim().is_empty(),
            Self::Typed(Value::Null) => true,
            Self::Typed(_) => false,
        }
    }

    fn string(self, key: &str) -> Result<String> {
        match self {
            Self::Text(s) => {
                util::percent_decode(s, &format!("the `{}` option must be URL encoded", key))
            }
            Self::Typed(Value::String(s)) => Ok(s.clone()),
            Self::Typed(_) => Err(Error::invalid_argument(format!(
                "the `{}` option must be a string",
                key
            ))),
        }
    }

    fn raw_string(self, key: &str) -> Result<String> {
        match self {
            Self::Text(s) => Ok(s.to_string()),
            Self::Typed(Value::String(s)) => Ok(s.clone()),
            Self::Typed(_) => Err(Error::invalid_argument(format!(
                "the `{}` option must be a string",
                key
            ))),
        }
    }

    fn boolean(self, key: &str) -> Result<bool> {
        let parsed = match self {
            Self::Text(s) => parse_boolean(s),
            Self::Typed(Value::Bool(b)) => Some(*b),
            Self::Typed(Value::String(s)) => parse_boolean(s),
            Self::Typed(_) => None,
        };

        parsed.ok_or_else(|| {
            Error::invalid_argument(format!("the `{}` option must be a boolean", key))
        })
    }

    fn u32(self, key: &str) -> Result<u32> {
        let parsed = match self {
            Self::Text(s) => s.parse::<u32>().ok(),
            Self::Typed(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Self::Typed(Value::String(s)) => s.trim().parse::<u32>().ok(),
            Self::Typed(_) => None,
        };

        parsed.ok_or_else(|| {
            Error::invalid_argument(format!(
                "the `{}` option must be a non-negative integer",
                key
            ))
        })
    }

    fn u64(self, key: &str) -> Result<u64> {
        let parsed = match self {
            Self::Text(s) => s.parse::<u64>().ok(),
            Self::Typed(Value::Number(n)) => n.as_u64(),
            Self::Typed(Value::String(s)) => s.trim().parse::<u64>().ok(),
            Self::Typed(_) => None,
        };

        parsed.ok_or_else(|| {
            Error::invalid_argument(format!(
                "the `{}` option must be a non-negative integer",
                key
            ))
        })
    }

    fn i32(self, key: &str) -> Result<i32> {
        let parsed = match self {
            Self::Text(s) => s.parse::<i32>().ok(),
            Self::Typed(Value::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            Self::Typed(Value::String(s)) => s.trim().parse::<i32>().ok(),
            Self::Typed(_) => None,
        };

        parsed.ok_or_else(|| {
            Error::invalid_argument(format!("the `{}` option must be an integer", key))
        })
    }
}

fn parse_boolean(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn unrecognized_option(key: &str) -> Error {
    let lowered = key.to_ascii_lowercase();
    let (score, candidate) = URI_OPTIONS.iter().fold((0.0, ""), |acc, option| {
        let score = jaro_winkler(option, &lowered);
        if score > acc.0 {
            (score, *option)
        } else {
            acc
        }
    });

    ErrorKind::UnrecognizedOption {
        key: key.to_string(),
        suggestion: (score >= 0.84).then(|| candidate.to_string()),
    }
    .into()
}

impl ConnectionOptions {
    /// Whether no option has been set on any group.
    pub(crate) fn is_empty(&self) -> bool {
        self == &ConnectionOptions::default()
    }

    /// Replaces each group or scalar present in `other` over the value
    /// currently held, leaving absent fields untouched.
    pub(crate) fn merge(&mut self, other: ConnectionOptions) {
        macro_rules! merge_fields {
            ($($field:ident),+ $(,)?) => {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field;
                    }
                )+
            };
        }

        merge_fields!(
            auth_source,
            replica_set,
            validate_options,
            app_name,
            connections,
            security,
            compression,
            write_concerns,
            read_concern,
        );
    }

    fn connections_mut(&mut self) -> &mut PoolOptions {
        self.connections.get_or_insert_with(Default::default)
    }

    fn security_mut(&mut self) -> &mut SecurityOptions {
        self.security.get_or_insert_with(Default::default)
    }

    fn compression_mut(&mut self) -> &mut CompressionOptions {
        self.compression.get_or_insert_with(Default::default)
    }

    fn write_concerns_mut(&mut self) -> &mut WriteConcernOptions {
        self.write_concerns.get_or_insert_with(Default::default)
    }

    fn read_concern_mut(&mut self) -> &mut ReadConcernOptions {
        self.read_concern.get_or_insert_with(Default::default)
    }

    /// Routes one option key/value pair into its typed field. Keys are
    /// matched case-insensitively; an unknown key is an error naming the key
    /// exactly as it was supplied.
    pub(crate) fn apply(&mut self, key: &str, value: RawValue<'_>) -> Result<()> {
        match key.to_ascii_lowercase().as_str() {
            k @ ("defaultauthdb" | "authdb" | "authsource") => {
                self.auth_source = Some(value.string(k)?);
            }
            k @ "appname" => {
                self.app_name = Some(value.string(k)?);
            }
            k @ "validateoptions" => {
                self.validate_options = Some(value.boolean(k)?);
            }
            k @ "replicaset" => {
                self.replica_set = Some(value.string(k)?);
            }
            k @ ("ssl" | "tls") => {
                self.security_mut().tls = Some(value.boolean(k)?);
            }
            k @ ("tlsinsecure" | "sslinsecure") => {
                self.security_mut().tls_insecure = Some(value.boolean(k)?);
            }
            k @ ("tlsallowinvalidcertificates" | "sslallowinvalidcertificates") => {
                self.security_mut().tls_allow_invalid_certificates = Some(value.boolean(k)?);
            }
            k @ ("tlsallowinvalidhostnames" | "sslallowinvalidhostnames") => {
                self.security_mut().tls_allow_invalid_hostnames = Some(value.boolean(k)?);
            }
            k @ ("tlscafile" | "sslcafile") => {
                self.security_mut().tls_ca_file = Some(value.string(k)?);
            }
            k @ ("tlscertificatekeyfile" | "sslcertificatekeyfile") => {
                self.security_mut().tls_certificate_key_file = Some(value.string(k)?);
            }
            k @ ("tlscertificatekeyfilepassword" | "sslcertificatekeyfilepassword") => {
                self.security_mut().tls_certificate_key_file_password = Some(value.string(k)?);
            }
            k @ "compressors" => {
                self.compression_mut().compressors = Some(value.raw_string(k)?.parse()?);
            }
            k @ "zlibcompressionlevel" => {
                let level = value.i32(k)?;
                if level < -1 {
                    return Err(Error::invalid_argument(
                        "'zlibCompressionLevel' cannot be less than -1",
                    ));
                }
                if level > 9 {
                    return Err(Error::invalid_argument(
                        "'zlibCompressionLevel' cannot be greater than 9",
                    ));
                }
                self.compression_mut().zlib_compression_level = Some(level);
            }
            k @ "autoreconnect" => {
                self.connections_mut().auto_reconnect = Some(value.boolean(k)?);
            }
            k @ "connecttimeoutms" => {
                self.connections_mut().connect_timeout_ms = Some(value.u64(k)?);
            }
            k @ "maxidletimems" => {
                self.connections_mut().max_idle_time_ms = Some(value.u64(k)?);
            }
            k @ "maxpoolsize" => {
                self.connections_mut().max_pool_size = Some(value.u32(k)?);
            }
            k @ "minpoolsize" => {
                self.connections_mut().min_pool_size = Some(value.u32(k)?);
            }
            k @ "poolsize" => {
                self.connections_mut().pool_size = Some(value.u32(k)?);
            }
            k @ "reconnectinterval" => {
                self.connections_mut().reconnect_interval = Some(value.u64(k)?);
            }
            k @ "reconnecttries" => {
                self.connections_mut().reconnect_tries = Some(value.u32(k)?);
            }
            k @ "waitqueuetimeoutms" => {
                self.connections_mut().wait_queue_timeout_ms = Some(value.u64(k)?);
            }
            k @ "readconcernlevel" => {
                self.read_concern_mut().read_concern_level =
                    Some(ReadConcernLevel::from_str(&value.raw_string(k)?));
            }
            k @ "readpreference" => {
                self.read_concern_mut().read_preference = Some(value.raw_string(k)?.parse()?);
            }
            k @ "retryreads" => {
                self.read_concern_mut().retry_reads = Some(value.boolean(k)?);
            }
            k @ ("j" | "journal") => {
                self.write_concerns_mut().journal = Some(value.boolean(k)?);
            }
            "w" => {
                if value.is_blank() {
                    return Ok(());
                }

                let w = match value {
                    RawValue::Text(text) => match text.parse::<i64>() {
                        Ok(n) if n < 0 => {
                            return Err(Error::invalid_argument(
                                "the `w` option cannot be a negative integer",
                            ))
                        }
                        Ok(n) => match u32::try_from(n) {
                            Ok(n) => Acknowledgment::Nodes(n),
                            Err(_) => {
                                return Err(Error::invalid_argument(
                                    "the `w` option must be a 32-bit integer",
                                ))
                            }
                        },
                        Err(_) => Acknowledgment::from(util::percent_decode(
                            text,
                            "the `w` option must be URL encoded",
                        )?),
                    },
                    RawValue::Typed(Value::Number(n)) => {
                        match n.as_u64().and_then(|n| u32::try_from(n).ok()) {
                            Some(n) => Acknowledgment::Nodes(n),
                            None => {
                                return Err(Error::invalid_argument(
                                    "the `w` option must be a non-negative integer",
                                ))
                            }
                        }
                    }
                    RawValue::Typed(Value::String(s)) => Acknowledgment::from(s.as_str()),
                    RawValue::Typed(_) => {
                        return Err(Error::invalid_argument(
                            "the `w` option must be an integer or a string",
                        ))
                    }
                };

                self.write_concerns_mut().w = Some(w);
            }
            k @ "wtimeoutms" => {
                self.write_concerns_mut().wtimeout_ms = Some(value.u64(k)?);
            }
            k @ "retrywrites" => {
                self.write_concerns_mut().retry_writes = Some(value.boolean(k)?);
            }
            _ => return Err(unrecognized_option(key)),
        }

        Ok(())
    }
}
