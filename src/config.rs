use crate::profile::{ConnectionProfile, CredentialTable};
use envconfig::Envconfig;
use std::time::Duration;

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,
    #[envconfig(from = "DATABASE_HOST", default = "localhost")]
    pub db_host: String,
    #[envconfig(from = "DATABASE_PORT", default = "5432")]
    pub db_port: u16,
    #[envconfig(from = "DATABASE_NAME", default = "club_registry")]
    pub db_name: String,

    #[envconfig(from = "MANAGEMENT_DB_USER", default = "management")]
    pub management_user: String,
    #[envconfig(from = "MANAGEMENT_DB_PASSWORD")]
    pub management_password: String,
    #[envconfig(from = "CLUB_HEAD_DB_USER", default = "club_head")]
    pub club_head_user: String,
    #[envconfig(from = "CLUB_HEAD_DB_PASSWORD")]
    pub club_head_password: String,
    #[envconfig(from = "VIEWER_DB_USER", default = "viewer")]
    pub viewer_user: String,
    #[envconfig(from = "VIEWER_DB_PASSWORD")]
    pub viewer_password: String,

    #[envconfig(from = "SESSION_TTL_MINUTES", default = "480")]
    pub session_ttl_minutes: u64,
}

impl Config {
    pub fn credentials(&self) -> CredentialTable {
        let profile = |principal: &str, secret: &str| ConnectionProfile {
            host: self.db_host.clone(),
            port: self.db_port,
            database: self.db_name.clone(),
            principal: principal.to_string(),
            secret: secret.to_string(),
        };
        CredentialTable {
            management: profile(&self.management_user, &self.management_password),
            club_head: profile(&self.club_head_user, &self.club_head_password),
            viewer: profile(&self.viewer_user, &self.viewer_password),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes * 60)
    }
}
