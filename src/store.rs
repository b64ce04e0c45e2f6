//! store.rs — In-memory persistence for users, students, courses, lessons and
//! attempts, plus the refresh-token revocation list.
//!
//! Every read used by the recommender goes through a single lock acquisition,
//! so each request scores against one consistent snapshot of the data.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Attempt, Course, Id, Lesson, Student, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unknown student.")]
    UnknownStudent,
    #[error("Unknown course.")]
    UnknownCourse,
    #[error("Unknown lesson.")]
    UnknownLesson,
    #[error("A user with this email already exists.")]
    DuplicateEmail,
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<Id, User>,
    students: BTreeMap<Id, Student>,
    courses: BTreeMap<Id, Course>,
    lessons: BTreeMap<Id, Lesson>,
    attempts: BTreeMap<Id, Attempt>,
    revoked_jti: HashSet<String>,
    next_id: Id,
}

impl Inner {
    fn alloc(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }
}

/// Thread-safe application store. Cheap to share via `Arc`.
#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- users ----

    pub fn create_user(
        &self,
        email: &str,
        full_name: &str,
        password_hash: String,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if inner.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let id = inner.alloc();
        let user = User {
            id,
            email: email.to_string(),
            full_name: full_name.to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn user_by_id(&self, id: Id) -> Option<User> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.users.get(&id).cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.users.values().find(|u| u.email == email).cloned()
    }

    // ---- students ----

    pub fn create_student(&self, name: &str, email: &str, user_id: Option<Id>) -> Student {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let id = inner.alloc();
        let student = Student {
            id,
            user_id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        inner.students.insert(id, student.clone());
        student
    }

    pub fn student_by_id(&self, id: Id) -> Option<Student> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.students.get(&id).cloned()
    }

    pub fn student_by_email(&self, email: &str) -> Option<Student> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.students.values().find(|s| s.email == email).cloned()
    }

    pub fn student_for_user(&self, user_id: Id) -> Option<Student> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .students
            .values()
            .find(|s| s.user_id == Some(user_id))
            .cloned()
    }

    /// Attach an existing student row to a login account and refresh its
    /// display name. Used by registration to reconcile pre-seeded students.
    pub fn link_student(&self, student_id: Id, user_id: Id, name: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let student = inner
            .students
            .get_mut(&student_id)
            .ok_or(StoreError::UnknownStudent)?;
        student.user_id = Some(user_id);
        student.name = name.to_string();
        Ok(())
    }

    // ---- courses & lessons ----

    pub fn add_course(&self, name: &str, description: &str, difficulty: u8) -> Course {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let id = inner.alloc();
        let course = Course {
            id,
            name: name.to_string(),
            description: description.to_string(),
            difficulty,
        };
        inner.courses.insert(id, course.clone());
        course
    }

    pub fn course_by_id(&self, id: Id) -> Option<Course> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.courses.get(&id).cloned()
    }

    pub fn course_by_name(&self, name: &str) -> Option<Course> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.courses.values().find(|c| c.name == name).cloned()
    }

    /// All courses in insertion order (ids are allocated monotonically).
    pub fn courses(&self) -> Vec<Course> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.courses.values().cloned().collect()
    }

    pub fn add_lesson(
        &self,
        course_id: Id,
        title: &str,
        tags: &[&str],
        order_index: u32,
    ) -> Result<Lesson, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if !inner.courses.contains_key(&course_id) {
            return Err(StoreError::UnknownCourse);
        }
        let id = inner.alloc();
        let lesson = Lesson {
            id,
            course_id,
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            order_index,
        };
        inner.lessons.insert(id, lesson.clone());
        Ok(lesson)
    }

    /// Lessons of a course ordered by `order_index`.
    pub fn lessons_for_course(&self, course_id: Id) -> Vec<Lesson> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut lessons: Vec<Lesson> = inner
            .lessons
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.order_index);
        lessons
    }

    // ---- attempts ----

    #[allow(clippy::too_many_arguments)]
    pub fn create_attempt(
        &self,
        student_id: Id,
        lesson_id: Id,
        timestamp: DateTime<Utc>,
        correctness: f64,
        hints_used: u32,
        duration_sec: u32,
    ) -> Result<Attempt, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if !inner.students.contains_key(&student_id) {
            return Err(StoreError::UnknownStudent);
        }
        if !inner.lessons.contains_key(&lesson_id) {
            return Err(StoreError::UnknownLesson);
        }
        let id = inner.alloc();
        let attempt = Attempt {
            id,
            student_id,
            lesson_id,
            timestamp,
            correctness,
            hints_used,
            duration_sec,
        };
        inner.attempts.insert(id, attempt.clone());
        Ok(attempt)
    }

    /// All attempts of a student within one course, in insertion order.
    pub fn attempts_for_course(&self, student_id: Id, course_id: Id) -> Vec<Attempt> {
        let inner = self.inner.read().expect("store lock poisoned");
        let lesson_ids: HashSet<Id> = inner
            .lessons
            .values()
            .filter(|l| l.course_id == course_id)
            .map(|l| l.id)
            .collect();
        inner
            .attempts
            .values()
            .filter(|a| a.student_id == student_id && lesson_ids.contains(&a.lesson_id))
            .cloned()
            .collect()
    }

    // ---- refresh-token revocation ----

    pub fn revoke_token(&self, jti: &str) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.revoked_jti.insert(jti.to_string());
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.revoked_jti.contains(jti)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lessons_come_back_ordered_by_index() {
        let store = Store::new();
        let course = store.add_course("C", "", 1);
        store.add_lesson(course.id, "second", &[], 2).unwrap();
        store.add_lesson(course.id, "first", &[], 1).unwrap();
        let titles: Vec<String> = store
            .lessons_for_course(course.id)
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn attempts_are_scoped_to_student_and_course() {
        let store = Store::new();
        let s1 = store.create_student("A", "a@example.com", None);
        let s2 = store.create_student("B", "b@example.com", None);
        let c1 = store.add_course("C1", "", 1);
        let c2 = store.add_course("C2", "", 1);
        let l1 = store.add_lesson(c1.id, "L1", &[], 1).unwrap();
        let l2 = store.add_lesson(c2.id, "L2", &[], 1).unwrap();
        let now = Utc::now();
        store.create_attempt(s1.id, l1.id, now, 1.0, 0, 10).unwrap();
        store.create_attempt(s1.id, l2.id, now, 1.0, 0, 10).unwrap();
        store.create_attempt(s2.id, l1.id, now, 1.0, 0, 10).unwrap();
        assert_eq!(store.attempts_for_course(s1.id, c1.id).len(), 1);
        assert_eq!(store.attempts_for_course(s1.id, c2.id).len(), 1);
        assert_eq!(store.attempts_for_course(s2.id, c2.id).len(), 0);
    }

    #[test]
    fn attempt_for_unknown_lesson_is_rejected() {
        let store = Store::new();
        let s = store.create_student("A", "a@example.com", None);
        let err = store
            .create_attempt(s.id, 999, Utc::now(), 1.0, 0, 10)
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownLesson);
    }
}
