use crate::{
    auth::Identity,
    error::Failure,
    executor::{Connector, Executor, Mutation},
    guard,
    models::{Event, NewEvent},
    profile::Role,
    statement::Statement,
    validate,
};
use serde::Deserialize;

macro_rules! select_events {
    ($tail:literal) => {
        concat!(
            "SELECT e.event_id, e.title, e.club_name, e.start_date, e.duration, ",
            "e.location, e.budget, e.number_of_participants FROM event e",
            $tail
        )
    };
}

pub async fn list_events<C: Connector>(
    db: &Executor<C>,
    role: Option<Role>,
) -> Result<Vec<Event>, Failure> {
    db.read(
        &Statement::new(select_events!("")).ordered_by("start_date DESC, event_id DESC"),
        role,
    )
    .await
}

/// Events starting today or later, soonest first.
pub async fn upcoming_events<C: Connector>(
    db: &Executor<C>,
    role: Option<Role>,
) -> Result<Vec<Event>, Failure> {
    db.read(
        &Statement::new(select_events!(" WHERE e.start_date >= CURRENT_DATE"))
            .ordered_by("start_date, event_id"),
        role,
    )
    .await
}

/// Creates an event and returns its generated id.
pub async fn create_event<C: Connector>(
    db: &Executor<C>,
    identity: Option<&Identity>,
    event: NewEvent,
) -> Result<i32, Failure> {
    #[derive(Deserialize)]
    struct Created {
        event_id: i32,
    }

    validate::new_event(&event)?;
    let identity = guard::ensure_can_edit(db, identity, &event.club_name).await?;

    let created = db
        .write_returning::<Created>(
            &Statement::new(
                "INSERT INTO event (title, club_name, start_date, duration, location, budget) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING event_id",
            )
            .bind(event.title.trim())
            .bind(event.club_name.as_str())
            .bind(event.start_date)
            .bind(event.duration)
            .bind(event.location.trim())
            .bind(event.budget)
            .returning(),
            Some(identity.role),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Failure::backend("insert returned no event id"))?;

    tracing::info!(
        event_id = created.event_id,
        club = %event.club_name,
        by = %identity.email,
        "event created"
    );
    Ok(created.event_id)
}

/// Deletes an event. Deleting an event that does not exist is a no-op.
pub async fn delete_event<C: Connector>(
    db: &Executor<C>,
    identity: Option<&Identity>,
    event_id: i32,
) -> Result<Mutation, Failure> {
    #[derive(Deserialize)]
    struct Owner {
        club_name: String,
    }

    let identity = guard::ensure_role(identity, &[Role::Management, Role::ClubHead])?;

    if identity.role == Role::ClubHead {
        let owner = db
            .read_one::<Owner>(
                &Statement::new("SELECT club_name FROM event WHERE event_id = $1").bind(event_id),
                Some(identity.role),
            )
            .await?;
        let Some(owner) = owner else {
            return Ok(Mutation::NoOp);
        };
        guard::ensure_can_edit(db, Some(identity), &owner.club_name).await?;
    }

    let mutation = db
        .write(
            &Statement::new("DELETE FROM event WHERE event_id = $1").bind(event_id),
            Some(identity.role),
        )
        .await?;

    tracing::info!(event_id, by = %identity.email, ?mutation, "event deleted");
    Ok(mutation)
}
