pub mod clubs;
pub mod dashboard;
pub mod events;
pub mod members;

#[cfg(test)]
pub(crate) fn identity(email: &str, role: crate::profile::Role) -> crate::auth::Identity {
    crate::auth::Identity {
        email: email.to_string(),
        role,
    }
}
