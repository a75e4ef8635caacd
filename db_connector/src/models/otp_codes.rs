use diesel::{deserialize::Queryable, prelude::Insertable, Selectable};

/// At most one live code per user; a new request replaces the old row.
/// `expires_at` is a unix timestamp in milliseconds.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::otp_codes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OtpCode {
    pub discord_id: String,
    pub code: String,
    pub expires_at: i64,
}
