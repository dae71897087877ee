//! Seed data written on first start and by `reset`.

use chrono::{DateTime, Utc};

use crate::types::{Subject, SubjectsDocument, UserId, UserProfile, UsersDocument};

/// The four default subjects, with no votes.
#[must_use]
pub fn default_subjects(now: DateTime<Utc>) -> SubjectsDocument {
    SubjectsDocument {
        subjects: vec![
            Subject::new(1, "Kubernetes", "🚢", now),
            Subject::new(2, "AWS Cloud", "☁️", now),
            Subject::new(3, "Ubuntu Linux", "🐧", now),
            Subject::new(4, "LangChain", "🔗", now),
        ],
    }
}

/// The default profile roster with no point accounts yet.
#[must_use]
pub fn default_users() -> UsersDocument {
    let profile = |id: &str, name: &str, avatar: &str| UserProfile {
        id: UserId::from(id),
        name: name.to_string(),
        avatar: avatar.to_string(),
    };

    UsersDocument {
        profiles: vec![
            profile("user1", "Alice", "👩‍💻"),
            profile("user2", "Bob", "👨‍💻"),
            profile("user3", "Charlie", "🧑‍💻"),
            profile("user4", "Diana", "👩‍🔬"),
        ],
        points: Default::default(),
    }
}
