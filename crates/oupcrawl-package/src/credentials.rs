//! Login credentials and the netrc file they are read from.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PackageError, Result};

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetrcEntry {
    pub login: Option<String>,
    pub password: Option<String>,
}

/// Parsed `.netrc`: per-machine entries plus the optional `default` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netrc {
    pub machines: Vec<(String, NetrcEntry)>,
    pub default: Option<NetrcEntry>,
}

enum Target {
    None,
    Machine(usize),
    Default,
}

impl Netrc {
    pub fn parse(content: &str) -> Self {
        let mut netrc = Netrc::default();
        let mut target = Target::None;
        let mut in_macdef = false;

        for line in content.lines() {
            // A macro body runs until the next blank line.
            if in_macdef {
                in_macdef = !line.trim().is_empty();
                continue;
            }

            let mut tokens = line.split_whitespace();
            while let Some(token) = tokens.next() {
                if token.starts_with('#') {
                    break;
                }
                match token {
                    "machine" => {
                        let Some(name) = tokens.next() else { break };
                        netrc.machines.push((name.to_string(), NetrcEntry::default()));
                        target = Target::Machine(netrc.machines.len() - 1);
                    }
                    "default" => {
                        netrc.default.get_or_insert_with(NetrcEntry::default);
                        target = Target::Default;
                    }
                    "login" | "password" | "account" => {
                        let Some(value) = tokens.next() else { break };
                        let entry = match target {
                            Target::Machine(i) => &mut netrc.machines[i].1,
                            Target::Default => netrc.default.get_or_insert_with(NetrcEntry::default),
                            Target::None => continue,
                        };
                        match token {
                            "login" => entry.login = Some(value.to_string()),
                            "password" => entry.password = Some(value.to_string()),
                            _ => {}
                        }
                    }
                    "macdef" => {
                        in_macdef = true;
                        break;
                    }
                    _ => {}
                }
            }
        }

        netrc
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PackageError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self::parse(&content))
    }

    /// Entry for `host`, falling back to `default`.
    pub fn entry(&self, host: &str) -> Option<&NetrcEntry> {
        self.machines
            .iter()
            .find(|(machine, _)| machine == host)
            .map(|(_, entry)| entry)
            .or(self.default.as_ref())
    }

    pub fn credentials(&self, host: &str) -> Result<Credentials> {
        let entry = self
            .entry(host)
            .ok_or_else(|| PackageError::Credentials(format!("no netrc entry for {host}")))?;
        let user = entry
            .login
            .clone()
            .ok_or_else(|| PackageError::Credentials(format!("no login for {host}")))?;
        Ok(Credentials::new(
            host,
            user,
            entry.password.clone().unwrap_or_default(),
        ))
    }
}

/// `~/.netrc`, when a home directory is known.
pub fn default_netrc_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".netrc"))
}

/// Credentials for `host` from the netrc at `netrc` (or the default location).
pub fn resolve(host: &str, netrc: Option<&Path>) -> Result<Credentials> {
    let path = match netrc {
        Some(path) => path.to_path_buf(),
        None => default_netrc_path()
            .ok_or_else(|| PackageError::Credentials("no netrc file given".to_string()))?,
    };
    Netrc::from_file(&path)?.credentials(host)
}
