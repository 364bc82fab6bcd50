//! Remote destination prefix shared by every transfer.

use std::fmt;

use crate::{Error, Result};

/// Remote location objects are copied to and from, e.g. `host:/srv/lfs`.
///
/// Built once at startup and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget(String);

impl RemoteTarget {
    /// Joins `tokens` with single spaces.
    ///
    /// Remote specifications containing spaces arrive split across several
    /// process arguments; joining restores them.
    pub fn from_args<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tokens
            .into_iter()
            .map(|t| t.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.trim().is_empty() {
            return Err(Error::EmptyRemote);
        }
        Ok(Self(joined))
    }

    /// Remote path of the object `oid`.
    ///
    /// A `/` is inserted unless the prefix already ends in one, so a bare
    /// `host:` maps to `host:/<oid>`.
    pub fn join(&self, oid: &str) -> String {
        if self.0.ends_with('/') {
            format!("{}{oid}", self.0)
        } else {
            format!("{}/{oid}", self.0)
        }
    }

    /// The prefix as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
