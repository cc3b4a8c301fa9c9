use super::person::Person;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A member of staff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Full display name
    pub name: String,
    pub role: Role,
    #[serde(flatten)]
    pub person: Person,
    pub manager: Option<Box<Employee>>,
    pub reports: Vec<Employee>,
    #[serde(default)]
    pub start_date: Option<chrono::NaiveDate>,
    pub skills: HashMap<String, u8>,
    #[serde(skip)]
    pub session: Option<SessionCache>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Engineer,
    TeamLead,
    Director,
}

#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    pub token: String,
}
