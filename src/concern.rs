//! Types for the write-concern and read-concern option groups.

use std::{fmt, str::FromStr};

use serde::{
    de::{Error as DeError, Unexpected},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::error::{Error, Result};

/// The type of the `w` field in a write concern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Acknowledgment {
    /// Requires acknowledgement that the write has reached the specified
    /// number of nodes.
    Nodes(u32),

    /// Requires acknowledgement that the write has reached the majority of
    /// nodes.
    Majority,

    /// Requires acknowledgement according to the given custom write concern
    /// (e.g. a tag-set name).
    Custom(String),
}

impl Serialize for Acknowledgment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Acknowledgment::Majority => serializer.serialize_str("majority"),
            Acknowledgment::Nodes(n) => serializer.serialize_u32(*n),
            Acknowledgment::Custom(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for Acknowledgment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IntOrString {
            Int(u32),
            String(String),
        }
        match IntOrString::deserialize(deserializer)? {
            IntOrString::String(s) => Ok(s.into()),
            IntOrString::Int(i) => Ok(i.into()),
        }
    }
}

impl From<u32> for Acknowledgment {
    fn from(i: u32) -> Self {
        Acknowledgment::Nodes(i)
    }
}

impl From<&str> for Acknowledgment {
    fn from(s: &str) -> Self {
        if s == "majority" {
            Acknowledgment::Majority
        } else {
            Acknowledgment::Custom(s.to_string())
        }
    }
}

impl From<String> for Acknowledgment {
    fn from(s: String) -> Self {
        if s == "majority" {
            Acknowledgment::Majority
        } else {
            Acknowledgment::Custom(s)
        }
    }
}

impl fmt::Display for Acknowledgment {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Acknowledgment::Nodes(n) => write!(fmt, "{}", n),
            Acknowledgment::Majority => fmt.write_str("majority"),
            Acknowledgment::Custom(name) => fmt.write_str(name),
        }
    }
}

/// The level of isolation requested for read operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadConcernLevel {
    /// Reads return the most recent data available on the queried node.
    Local,

    /// Reads return data acknowledged by a majority of the replica set.
    Majority,

    /// Reads reflect all successful majority-acknowledged writes that
    /// completed before the read began.
    Linearizable,

    /// Reads return data with no guarantee that it has been written to a
    /// majority of the replica set.
    Available,

    /// A custom read concern level, kept for forwards compatibility with
    /// levels added in newer server versions.
    Custom(String),
}

impl ReadConcernLevel {
    pub(crate) fn from_str(s: &str) -> Self {
        match s {
            "local" => ReadConcernLevel::Local,
            "majority" => ReadConcernLevel::Majority,
            "linearizable" => ReadConcernLevel::Linearizable,
            "available" => ReadConcernLevel::Available,
            s => ReadConcernLevel::Custom(s.to_string()),
        }
    }

    /// Gets the string representation of the `ReadConcernLevel`.
    pub fn as_str(&self) -> &str {
        match self {
            ReadConcernLevel::Local => "local",
            ReadConcernLevel::Majority => "majority",
            ReadConcernLevel::Linearizable => "linearizable",
            ReadConcernLevel::Available => "available",
            ReadConcernLevel::Custom(ref s) => s,
        }
    }
}

impl fmt::Display for ReadConcernLevel {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl Serialize for ReadConcernLevel {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ReadConcernLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ReadConcernLevel::from_str(&s))
    }
}

/// Which replica-set members read operations should be directed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadPreference {
    /// Only route this operation to the primary.
    Primary,

    /// Route this operation to the primary if it's available, but fall back
    /// to the secondaries if not.
    PrimaryPreferred,

    /// Only route this operation to a secondary.
    Secondary,

    /// Route this operation to a secondary if one is available, but fall
    /// back to the primary if not.
    SecondaryPreferred,

    /// Route this operation to the node with the least network latency
    /// regardless of whether it's the primary or a secondary.
    Nearest,
}

impl ReadPreference {
    /// Gets the string representation of the `ReadPreference`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadPreference::Primary => "primary",
            ReadPreference::PrimaryPreferred => "primaryPreferred",
            ReadPreference::Secondary => "secondary",
            ReadPreference::SecondaryPreferred => "secondaryPreferred",
            ReadPreference::Nearest => "nearest",
        }
    }
}

impl FromStr for ReadPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match &s.to_lowercase()[..] {
            "primary" => Ok(ReadPreference::Primary),
            "primarypreferred" => Ok(ReadPreference::PrimaryPreferred),
            "secondary" => Ok(ReadPreference::Secondary),
            "secondarypreferred" => Ok(ReadPreference::SecondaryPreferred),
            "nearest" => Ok(ReadPreference::Nearest),
            other => Err(Error::invalid_argument(format!(
                "'{}' is not a valid read preference",
                other
            ))),
        }
    }
}

impl fmt::Display for ReadPreference {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl Serialize for ReadPreference {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReadPreference {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        ReadPreference::from_str(&s)
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&s), &"a read preference mode"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgment_from_string_recognizes_majority() {
        assert_eq!(Acknowledgment::from("majority"), Acknowledgment::Majority);
        assert_eq!(
            Acknowledgment::from("myTag"),
            Acknowledgment::Custom("myTag".to_string())
        );
    }

    #[test]
    fn acknowledgment_displays_like_its_wire_form() {
        assert_eq!(Acknowledgment::Nodes(2).to_string(), "2");
        assert_eq!(Acknowledgment::Majority.to_string(), "majority");
    }

    #[test]
    fn read_concern_level_keeps_unknown_levels() {
        assert_eq!(
            ReadConcernLevel::from_str("snapshot"),
            ReadConcernLevel::Custom("snapshot".to_string())
        );
        assert_eq!(ReadConcernLevel::from_str("majority"), ReadConcernLevel::Majority);
    }

    #[test]
    fn read_preference_parses_case_insensitively() {
        assert_eq!(
            "secondaryPreferred".parse::<ReadPreference>().unwrap(),
            ReadPreference::SecondaryPreferred
        );
        assert_eq!(
            "NEAREST".parse::<ReadPreference>().unwrap(),
            ReadPreference::Nearest
        );
    }

    #[test]
    fn read_preference_rejects_unknown_modes() {
        assert!("closest".parse::<ReadPreference>().is_err());
    }
}
