use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid repository \"{value}\": expected \"owner/name\"")]
pub struct RepoParseError {
    pub value: String,
}

/// A repository on the issue tracker, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Parse `"owner/name"` into a `RepoRef`.
    pub fn from_full_name(s: &str) -> Option<Self> {
        let (owner, name) = s.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = RepoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_full_name(s).ok_or_else(|| RepoParseError {
            value: s.to_owned(),
        })
    }
}

impl Serialize for RepoRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepoRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let repo: RepoRef = "svemailproject/TheySoldMyEmail".parse().unwrap();
        assert_eq!(repo.owner, "svemailproject");
        assert_eq!(repo.name, "TheySoldMyEmail");
        assert_eq!(repo.to_string(), "svemailproject/TheySoldMyEmail");
    }

    #[test]
    fn rejects_malformed_names() {
        assert!("no-slash".parse::<RepoRef>().is_err());
        assert!("/name".parse::<RepoRef>().is_err());
        assert!("owner/".parse::<RepoRef>().is_err());
        assert!("a/b/c".parse::<RepoRef>().is_err());
    }
}
