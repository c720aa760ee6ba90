//! Host environment snapshot.

use kettle_shared::errors::{KettleError, KettleResult};
use std::collections::BTreeMap;

/// Host environment captured at bridge entry.
///
/// Later changes to the host environment are not reflected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Capture the current process environment.
    ///
    /// Fails if any variable is not valid Unicode; a snapshot is never
    /// partial.
    pub fn capture() -> KettleResult<Self> {
        Self::try_from_os_vars(std::env::vars_os())
    }

    fn try_from_os_vars<I>(vars: I) -> KettleResult<Self>
    where
        I: IntoIterator<Item = (std::ffi::OsString, std::ffi::OsString)>,
    {
        let mut out = BTreeMap::new();
        for (name, value) in vars {
            let name = name.into_string().map_err(|raw| {
                KettleError::EnvironmentCopy(format!(
                    "variable name {:?} is not valid unicode",
                    raw
                ))
            })?;
            let value = value.into_string().map_err(|_| {
                KettleError::EnvironmentCopy(format!("value of {} is not valid unicode", name))
            })?;
            out.insert(name, value);
        }
        Ok(Self { vars: out })
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
