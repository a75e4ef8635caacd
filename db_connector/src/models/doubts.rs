use diesel::{associations::Identifiable, deserialize::Queryable, prelude::Insertable, Selectable};

pub const STATUS_OPEN: &str = "open";
pub const STATUS_RESOLVED: &str = "resolved";

/// `channel_id`/`message_id` reference the announcement message in the
/// open-doubts channel. They stay `None` when posting the announcement
/// failed; archival on close is skipped in that case.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::doubts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Doubt {
    pub id: i32,
    pub discord_id: String,
    pub username: String,
    pub question: String,
    pub created_at: i64,
    pub status: String,
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::doubts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewDoubt {
    pub discord_id: String,
    pub username: String,
    pub question: String,
    pub created_at: i64,
    pub status: String,
}
