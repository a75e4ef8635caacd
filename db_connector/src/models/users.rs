use diesel::{associations::Identifiable, deserialize::Queryable, prelude::Insertable, Selectable};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(primary_key(discord_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub discord_id: String,
    pub email: String,
    pub verified: bool,
}
