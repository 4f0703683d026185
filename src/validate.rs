use crate::{
    error::Failure,
    models::{NewEvent, NewMember},
};
use regex::Regex;

lazy_static::lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn email(email: &str) -> Result<(), Failure> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Failure::invalid("email is required"));
    }
    if !EMAIL.is_match(email) {
        return Err(Failure::invalid("please enter a valid email address"));
    }
    Ok(())
}

pub fn required(field: &'static str, value: &str) -> Result<(), Failure> {
    if value.trim().is_empty() {
        return Err(Failure::invalid(format!("{field} is required")));
    }
    Ok(())
}

pub fn new_event(event: &NewEvent) -> Result<(), Failure> {
    required("title", &event.title)?;
    required("club", &event.club_name)?;
    required("location", &event.location)?;
    if event.duration < 1 {
        return Err(Failure::invalid("duration must be at least one hour"));
    }
    if !event.budget.is_finite() || event.budget < 0.0 {
        return Err(Failure::invalid("budget cannot be negative"));
    }
    Ok(())
}

pub fn new_member(member: &NewMember) -> Result<(), Failure> {
    required("srn", &member.member_srn)?;
    required("name", &member.name)?;
    required("phone number", &member.phone_number)?;
    required("department", &member.depart_id)?;
    email(&member.email)?;
    if !(0.0..=10.0).contains(&member.cgpa) {
        return Err(Failure::invalid("cgpa must be between 0 and 10"));
    }
    Ok(())
}
