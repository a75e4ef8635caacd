use diesel::{associations::Identifiable, deserialize::Queryable, prelude::Insertable, Selectable};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::solutions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Solution {
    pub id: i32,
    pub doubt_id: i32,
    pub solver_id: String,
    pub answer: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::solutions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewSolution {
    pub doubt_id: i32,
    pub solver_id: String,
    pub answer: String,
    pub created_at: i64,
}
