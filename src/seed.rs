//! seed.rs — demo fixtures for local development. Idempotent: re-running
//! against an already-seeded store is a no-op.

use chrono::Utc;
use tracing::info;

use crate::store::Store;

pub fn seed_demo(store: &Store) {
    if store.course_by_name("Python Basics").is_some() {
        return;
    }

    let student = match store.student_by_email("ananya@example.com") {
        Some(s) => s,
        None => store.create_student("Ananya", "ananya@example.com", None),
    };

    let python = store.add_course("Python Basics", "Intro to Python", 1);
    let js = store.add_course("JavaScript Foundations", "JS core", 2);
    let ai = store.add_course("Intro to AI Concepts", "Logic & data", 2);

    // add_lesson only fails for an unknown course; these were just created.
    let variables = store
        .add_lesson(python.id, "Variables", &["variables"], 1)
        .expect("seed lesson");
    let _ = store.add_lesson(python.id, "Loops", &["loops"], 2);
    let _ = store.add_lesson(js.id, "Arrays", &["arrays"], 1);
    let _ = store.add_lesson(js.id, "Conditions", &["conditions"], 2);
    let _ = store.add_lesson(ai.id, "What is AI?", &["logic", "data"], 1);

    store
        .create_attempt(student.id, variables.id, Utc::now(), 0.6, 1, 600)
        .expect("seed attempt");

    info!("seeded demo data");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_twice_does_not_duplicate() {
        let store = Store::new();
        seed_demo(&store);
        seed_demo(&store);
        assert_eq!(store.courses().len(), 3);
        let student = store.student_by_email("ananya@example.com").unwrap();
        let python = store.course_by_name("Python Basics").unwrap();
        assert_eq!(store.attempts_for_course(student.id, python.id).len(), 1);
        assert_eq!(store.lessons_for_course(python.id).len(), 2);
    }
}
