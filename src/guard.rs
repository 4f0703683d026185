use crate::{
    auth::Identity,
    error::Failure,
    executor::{Connector, Executor},
    profile::Role,
    statement::Statement,
};

pub fn require_role(identity: Option<&Identity>, allowed: &[Role]) -> bool {
    identity.map_or(false, |i| allowed.contains(&i.role))
}

pub fn ensure_role<'a>(
    identity: Option<&'a Identity>,
    allowed: &[Role],
) -> Result<&'a Identity, Failure> {
    match identity {
        Some(identity) if allowed.contains(&identity.role) => Ok(identity),
        Some(identity) => {
            tracing::info!(email = %identity.email, role = %identity.role, "role not allowed");
            Err(Failure::denied("you don't have permission to perform this action"))
        }
        None => Err(Failure::denied("you need to log in to perform this action")),
    }
}

// Association is read on every call; it can change between requests.
pub async fn can_edit<C: Connector>(
    db: &Executor<C>,
    identity: &Identity,
    club_name: &str,
) -> Result<bool, Failure> {
    match identity.role {
        Role::Management => Ok(true),
        Role::ClubHead => {
            let links: Vec<serde_json::Value> = db
                .read(
                    &Statement::new(
                        "SELECT 1 AS linked FROM club_head_association \
                         WHERE email = $1 AND club_name = $2",
                    )
                    .bind(identity.email.as_str())
                    .bind(club_name),
                    Some(identity.role),
                )
                .await?;
            Ok(!links.is_empty())
        }
        Role::ClubMember | Role::Viewer => Ok(false),
    }
}

pub async fn ensure_can_edit<'a, C: Connector>(
    db: &Executor<C>,
    identity: Option<&'a Identity>,
    club_name: &str,
) -> Result<&'a Identity, Failure> {
    let Some(identity) = identity else {
        return Err(Failure::denied("you need to log in to perform this action"));
    };
    if can_edit(db, identity, club_name).await? {
        return Ok(identity);
    }
    tracing::info!(email = %identity.email, club = club_name, "club edit refused");
    Err(Failure::denied("you don't have permission to edit this club"))
}
