//! Built-in data for demo mode.

use crate::tables::Row;
use crate::MemoryTables;
use loop_auth::MemoryAuth;
use serde_json::{json, Value};

pub const DEMO_EMAIL: &str = "demo@loopsocial.app";
pub const DEMO_PASSWORD: &str = "loop-demo";
pub const DEMO_USER_ID: &str = "demo-user";

/// Auth provider with the demo account registered.
pub fn demo_auth() -> MemoryAuth {
    MemoryAuth::new().with_account(DEMO_EMAIL, DEMO_PASSWORD, DEMO_USER_ID)
}

/// Tables seeded with a handful of groups, posts and profiles.
pub fn demo_tables() -> MemoryTables {
    let tables = MemoryTables::new();
    tables.seed("profiles", profiles());
    tables.seed("groups", groups());
    tables.seed("posts", posts());
    tables.seed(
        "group_members",
        vec![
            row(json!({"group_id": 1, "user_id": DEMO_USER_ID, "role": "member"})),
            row(json!({"group_id": 2, "user_id": DEMO_USER_ID, "role": "member"})),
        ],
    );
    tables.seed(
        "post_likes",
        vec![row(json!({"post_id": 2, "user_id": DEMO_USER_ID}))],
    );
    tables
}

fn profiles() -> Vec<Row> {
    [
        (DEMO_USER_ID, "Demo User", "Product Designer", "Lisbon"),
        ("user-michael", "Michael Chen", "Product Lead at Adobe", "San Jose"),
        ("user-jessica", "Jessica Wong", "UX Designer", "Vancouver"),
        ("user-robert", "Robert Johnson", "Director of Product", "Austin"),
    ]
    .into_iter()
    .map(|(id, name, title, location)| {
        let seed: String = name.split_whitespace().collect();
        row(json!({
            "id": id,
            "full_name": name,
            "avatar_url": format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed),
            "title": title,
            "location": location,
        }))
    })
    .collect()
}

fn groups() -> Vec<Row> {
    [
        (1, "Product Management Professionals", "A community for product managers to share insights, best practices, and career advice.", "Product Management", 2547, 128, "photo-1552664730-d307ca884978"),
        (2, "UX/UI Design Network", "Connect with designers, share your work, and get feedback from industry experts.", "Design", 1832, 95, "photo-1561070791-2526d30994b5"),
        (3, "Software Engineering Hub", "Discussions on software development, architecture, and engineering best practices.", "Engineering", 3214, 156, "photo-1573495612937-f978cc14e4b9"),
        (4, "Data Science Collective", "Share knowledge about data analysis, machine learning, and AI applications.", "Data Science", 1956, 87, "photo-1551288049-bebda4e38f71"),
        (5, "Marketing Innovators", "Explore the latest marketing strategies, tools, and industry trends.", "Marketing", 1423, 73, "photo-1533750349088-cd871a92f312"),
        (6, "Startup Founders", "A community for entrepreneurs to share experiences and get advice on building startups.", "Entrepreneurship", 1876, 104, "photo-1559136555-9303baea8ebd"),
    ]
    .into_iter()
    .map(|(id, name, description, category, members, posts, photo)| {
        row(json!({
            "id": id,
            "name": name,
            "description": description,
            "category": category,
            "member_count": members,
            "post_count": posts,
            "image": format!("https://images.unsplash.com/{}?w=800&q=80", photo),
        }))
    })
    .collect()
}

fn posts() -> Vec<Row> {
    vec![
        row(json!({
            "id": 1,
            "user_id": "user-michael",
            "group_id": 1,
            "group_name": "Product Management Professionals",
            "content": "Just published a new article on product discovery techniques that have worked well for our team. Check it out and let me know your thoughts! #ProductDiscovery #UserResearch",
            "likes_count": 34,
            "comments_count": 8,
            "shares_count": 5,
            "created_at": "2026-01-15T10:00:00+00:00",
        })),
        row(json!({
            "id": 2,
            "user_id": "user-jessica",
            "group_id": 2,
            "group_name": "UX/UI Design Network",
            "content": "I'm working on redesigning our onboarding flow and would love some feedback. What do you think about the user journey? #UXDesign #Wireframing",
            "likes_count": 27,
            "comments_count": 15,
            "shares_count": 3,
            "created_at": "2026-01-15T07:00:00+00:00",
        })),
        row(json!({
            "id": 3,
            "user_id": "user-robert",
            "group_id": 1,
            "group_name": "Product Management Professionals",
            "content": "We're hosting a virtual panel discussion next week on 'Building Products in Uncertain Times'. Register now to secure your spot! #ProductLeadership #VirtualEvent",
            "likes_count": 42,
            "comments_count": 7,
            "shares_count": 12,
            "created_at": "2026-01-14T12:00:00+00:00",
        })),
    ]
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}
