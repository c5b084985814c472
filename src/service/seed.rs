//! Mock 数据源的种子数据

use crate::auth::User;
use crate::tasks::{
    Comment, NewSubtask, NewTask, Participant, Priority, Progress, Response, Subtask, Task,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Mock 登录成功时返回的固定 token
pub const MOCK_TOKEN: &str = "mock-token-123";
pub const MOCK_EMAIL: &str = "test@example.com";
/// 种子用户唯一可用的密码
pub const MOCK_PASSWORD: &str = "password";

pub fn mock_user() -> User {
    let now = Utc::now();
    User {
        id: "1".to_string(),
        email: MOCK_EMAIL.to_string(),
        display_name: "Test User".to_string(),
        photo_url: None,
        created_at: now,
        last_updated: now,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn subtask(id: &str, title: &str, progress: u8, now: DateTime<Utc>) -> Subtask {
    Subtask::from_new(
        id,
        NewSubtask::new(title).with_progress(Progress::saturating(progress as i64)),
        "1",
        now,
    )
}

pub fn seed_tasks() -> Vec<Task> {
    let now = Utc::now();
    let team = vec![
        Participant::new("user1@example.com", "User 1"),
        Participant::new("user2@example.com", "User 2"),
    ];

    let docs = Task::from_new(
        "1",
        NewTask::new(
            "Complete project documentation",
            "Write comprehensive documentation for the project",
            date(2024, 3, 20),
            "1",
        )
        .with_priority(Priority::High)
        .with_participants(team.clone()),
        now,
    );

    let ui = Task::from_new(
        "2",
        NewTask::new(
            "Fix UI bugs",
            "Address reported UI issues in the dashboard",
            date(2024, 3, 22),
            "2",
        )
        .with_priority(Priority::Medium)
        .with_participants(vec![
            Participant::new(MOCK_EMAIL, "Test User").with_id("1"),
        ]),
        now,
    );

    let features = Task::from_new(
        "3",
        NewTask::new(
            "Add new features",
            "Implement new features as per requirements",
            date(2024, 3, 25),
            "3",
        )
        .with_priority(Priority::Low)
        .with_participants(team),
        now,
    );

    let earlier = now - Duration::hours(2);
    let nft = Task::from_new(
        "4",
        NewTask::new(
            "NFT Mobile App Design",
            "Design and implement a modern NFT marketplace mobile app with user authentication, wallet integration, and trading features.",
            date(2024, 9, 1),
            "1",
        )
        .with_priority(Priority::High)
        .with_participants(vec![
            Participant::new("john@example.com", "John Doe").with_id("11"),
            Participant::new("jane@example.com", "Jane Smith").with_id("12"),
            Participant::new("mike@example.com", "Mike Johnson").with_id("13"),
        ]),
        earlier,
    )
    .with_subtask_at(subtask("1", "Design Home Screen", 60, earlier), earlier)
    .with_subtask_at(subtask("2", "Implement User Authentication", 100, earlier), earlier)
    .with_subtask_at(subtask("3", "Create NFT Gallery", 30, earlier), earlier)
    .with_comment_at(
        "1",
        Comment::new("1", "John Doe", "Added new color scheme for better contrast", earlier),
        earlier,
    )
    .with_response_at(
        "1",
        "1",
        Response::new(
            "1-1",
            "Jane Smith",
            "The contrast looks good, but we should adjust the font size",
            now - Duration::hours(1),
        ),
        now,
    )
    .with_comment_at(
        "1",
        Comment::new("2", "Jane Smith", "Please review the latest changes", now - Duration::hours(1)),
        now,
    )
    .with_comment_at(
        "2",
        Comment::new("1", "Mike Johnson", "Authentication flow completed", now - Duration::days(1)),
        now,
    )
    .with_comment_at(
        "3",
        Comment::new("1", "John Doe", "Working on grid layout", now - Duration::hours(3)),
        now,
    );

    vec![docs, ui, features, nft]
}
