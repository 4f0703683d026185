use crate::{
    auth::Identity,
    error::Failure,
    executor::{Connector, Executor, Mutation},
    guard,
    models::{Club, ClubUpdate},
    profile::Role,
    statement::{contains_pattern, SelectBuilder, Statement},
    validate,
};

const DIRECTORY: &str = "SELECT c.club_name AS name, c.club_email AS email, c.instagram_handle, \
     c.depart_id AS department_id, c.faculty_advisor_srn, d.department_name, \
     f.name AS faculty_advisor \
     FROM club c \
     JOIN department d ON c.depart_id = d.depart_id \
     JOIN faculty_advisor f ON c.faculty_advisor_srn = f.srn";

/// The club directory. Club heads only see the clubs they run; `search`
/// matches club or department names.
pub async fn list_clubs<C: Connector>(
    db: &Executor<C>,
    identity: Option<&Identity>,
    search: Option<&str>,
) -> Result<Vec<Club>, Failure> {
    let mut query = SelectBuilder::new(DIRECTORY);

    if let Some(head) = identity.filter(|i| i.role == Role::ClubHead) {
        query = query.and_where(
            "c.club_name IN (SELECT club_name FROM club_head_association WHERE email = ?)",
            [head.email.as_str()],
        );
    }

    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        query = query.and_where(
            "c.club_name ILIKE ? OR d.department_name ILIKE ?",
            [pattern.clone(), pattern],
        );
    }

    db.read(&query.order_by("name").build(), identity.map(|i| i.role))
        .await
}

pub async fn update_club<C: Connector>(
    db: &Executor<C>,
    identity: Option<&Identity>,
    club_name: &str,
    update: ClubUpdate,
) -> Result<Mutation, Failure> {
    let identity = guard::ensure_can_edit(db, identity, club_name).await?;
    validate::email(&update.email)?;

    let instagram_handle = update
        .instagram_handle
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());

    let mutation = db
        .write(
            &Statement::new(
                "UPDATE club SET club_email = $1, instagram_handle = $2 WHERE club_name = $3",
            )
            .bind(update.email.trim())
            .bind(instagram_handle)
            .bind(club_name),
            Some(identity.role),
        )
        .await?;

    tracing::info!(club = club_name, by = %identity.email, ?mutation, "club updated");
    Ok(mutation)
}
