use crate::{
    auth::Identity,
    error::Failure,
    executor::{Connector, Executor, Mutation},
    guard,
    models::{Department, NewMember},
    profile::Role,
    statement::Statement,
    validate,
};

pub async fn list_departments<C: Connector>(
    db: &Executor<C>,
    role: Option<Role>,
) -> Result<Vec<Department>, Failure> {
    db.read(
        &Statement::new("SELECT depart_id, department_name FROM department")
            .ordered_by("department_name"),
        role,
    )
    .await
}

/// Enrolls a new club member. Only management and club heads may register
/// members. An SRN that is already taken is a validation failure, decided by
/// the insert itself.
pub async fn register_member<C: Connector>(
    db: &Executor<C>,
    identity: Option<&Identity>,
    member: NewMember,
) -> Result<Mutation, Failure> {
    let identity = guard::ensure_role(identity, &[Role::Management, Role::ClubHead])?;
    validate::new_member(&member)?;

    let srn = member.member_srn.trim();
    let mutation = db
        .write(
            &Statement::new(
                "INSERT INTO club_member (member_srn, name, email, phone_number, cgpa, depart_id) \
                 VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (member_srn) DO NOTHING",
            )
            .bind(srn)
            .bind(member.name.trim())
            .bind(member.email.trim())
            .bind(member.phone_number.trim())
            .bind(member.cgpa)
            .bind(member.depart_id.as_str()),
            Some(identity.role),
        )
        .await?;
    if mutation == Mutation::NoOp {
        tracing::info!(srn, by = %identity.email, "member already registered");
        return Err(Failure::invalid("member already exists"));
    }

    tracing::info!(srn, by = %identity.email, "member registered");
    Ok(mutation)
}
