use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Management,
    ClubHead,
    ClubMember,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Management => "management",
            Role::ClubHead => "club_head",
            Role::ClubMember => "club_member",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.trim() {
            "management" => Some(Role::Management),
            "club_head" => Some(Role::ClubHead),
            "club_member" => Some(Role::ClubMember),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub principal: String,
    pub secret: String,
}

impl ConnectionProfile {
    /// Postgres connection url with the principal and secret percent-encoded.
    pub fn url(&self) -> anyhow::Result<String> {
        let mut url = Url::parse(&format!("postgres://{}:{}", self.host, self.port))?;
        url.set_path(&self.database);
        url.set_username(&self.principal)
            .map_err(|_| anyhow::anyhow!("cannot set database principal on url"))?;
        url.set_password(Some(&self.secret))
            .map_err(|_| anyhow::anyhow!("cannot set database secret on url"))?;
        Ok(url.into())
    }
}

// keep the secret out of logs
impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

/// One profile per privilege level. `viewer` is the least-privileged,
/// read-only profile and doubles as the default.
#[derive(Debug, Clone)]
pub struct CredentialTable {
    pub management: ConnectionProfile,
    pub club_head: ConnectionProfile,
    pub viewer: ConnectionProfile,
}

impl CredentialTable {
    pub fn resolve_profile(&self, role: Option<Role>) -> &ConnectionProfile {
        match role {
            Some(Role::Management) => &self.management,
            Some(Role::ClubHead) => &self.club_head,
            Some(Role::ClubMember) | Some(Role::Viewer) | None => &self.viewer,
        }
    }

    /// Resolves a raw role string. Anything unrecognized gets the default
    /// profile rather than an error.
    pub fn resolve_profile_str(&self, role: Option<&str>) -> &ConnectionProfile {
        self.resolve_profile(role.and_then(Role::parse))
    }

    pub fn profiles(&self) -> [&ConnectionProfile; 3] {
        [&self.management, &self.club_head, &self.viewer]
    }
}

#[cfg(test)]
pub(crate) fn test_table() -> CredentialTable {
    let profile = |principal: &str| ConnectionProfile {
        host: "localhost".to_string(),
        port: 5432,
        database: "club_registry".to_string(),
        principal: principal.to_string(),
        secret: format!("{principal}-secret"),
    };
    CredentialTable {
        management: profile("management"),
        club_head: profile("club_head"),
        viewer: profile("viewer"),
    }
}
