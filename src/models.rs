use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Club {
    pub name: String,
    pub email: String,
    pub instagram_handle: Option<String>,
    pub department_id: String,
    pub faculty_advisor_srn: String,
    pub department_name: String,
    pub faculty_advisor: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubUpdate {
    pub email: String,
    pub instagram_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ClubStats {
    pub club_name: String,
    pub club_email: String,
    pub instagram_handle: Option<String>,
    pub total_events: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Event {
    pub event_id: i32,
    pub title: String,
    pub club_name: String,
    pub start_date: NaiveDate,
    pub duration: i32,
    pub location: String,
    pub budget: f64,
    pub number_of_participants: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub club_name: String,
    pub start_date: NaiveDate,
    pub duration: i32,
    pub location: String,
    pub budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Department {
    pub depart_id: String,
    pub department_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub member_srn: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub cgpa: f64,
    pub depart_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Club,
    Department,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ChangeLogEntry {
    pub kind: ChangeKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub clubs: i64,
    pub events: i64,
}
