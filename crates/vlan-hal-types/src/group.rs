//! Group (bridge) names and the vendor naming pattern.

use crate::{is_name_char, ParseError, MAX_NAME_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bridge prefix used by broadband gateways for LAN bridges (`brlan0`, `brlan1`, ...).
pub const DEFAULT_GROUP_PREFIX: &str = "brlan";

/// A syntactically valid group/bridge name.
///
/// Parsing a `GroupName` only checks the character set and length. Whether a
/// name is one the HAL manages is decided by [`GroupNamePattern::recognize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    /// Creates a group name after checking length and character set.
    pub fn new(name: impl Into<String>) -> Result<Self, ParseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ParseError::Empty("group name"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ParseError::TooLong {
                field: "group name",
                value: name,
                max: MAX_NAME_LEN,
            });
        }
        if !name.chars().all(is_name_char) {
            return Err(ParseError::InvalidGroupName(name));
        }
        Ok(GroupName(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for GroupName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupName::new(s)
    }
}

impl TryFrom<String> for GroupName {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        GroupName::new(s)
    }
}

impl From<GroupName> for String {
    fn from(name: GroupName) -> String {
        name.0
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The vendor-defined pattern for group names: `<prefix><N>`.
///
/// Matching is case-sensitive. The prefix must be followed by at least one
/// decimal digit and nothing else, so `brlan0` and `brlan12` match while
/// `brlan`, `BrLan0`, `brlan0x` and `1234` do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupNamePattern {
    prefixes: Vec<String>,
}

impl GroupNamePattern {
    /// Creates a pattern accepting any of the given prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the configured prefixes.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Returns true if `name` matches `<prefix><digits>` for some prefix.
    pub fn matches(&self, name: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            name.strip_prefix(prefix.as_str())
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        })
    }

    /// Parses `name` and checks it against the pattern.
    pub fn recognize(&self, name: &str) -> Result<GroupName, ParseError> {
        let group = GroupName::new(name)?;
        if !self.matches(group.as_str()) {
            return Err(ParseError::UnrecognizedGroupName {
                name: name.to_string(),
                expected: self.describe(),
            });
        }
        Ok(group)
    }

    fn describe(&self) -> String {
        self.prefixes
            .iter()
            .map(|p| format!("{}<N>", p))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for GroupNamePattern {
    fn default() -> Self {
        Self::new([DEFAULT_GROUP_PREFIX])
    }
}
