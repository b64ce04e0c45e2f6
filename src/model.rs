//! model.rs — Core entities. Kept plain: the in-memory store owns identity
//! allocation and all invariants that span entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = u64;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: Id,
    /// Login account this student is linked to, if any. Demo-seeded students
    /// start unlinked and get attached on registration with the same email.
    pub user_id: Option<Id>,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub difficulty: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Id,
    pub course_id: Id,
    pub title: String,
    pub tags: Vec<String>,
    pub order_index: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub id: Id,
    pub student_id: Id,
    pub lesson_id: Id,
    pub timestamp: DateTime<Utc>,
    /// Fraction of the lesson solved correctly, in [0, 1].
    pub correctness: f64,
    pub hints_used: u32,
    pub duration_sec: u32,
}
