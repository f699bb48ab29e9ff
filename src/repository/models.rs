//! Diesel row types.

use diesel::prelude::*;

use crate::schema;

/// Cached batch row from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::tools_weekly_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BatchCacheRow {
    pub id: String,
    pub category: String,
    pub tools_data: String,
    pub total_products: i32,
    pub created_at: String,
    pub expires_at: String,
    pub last_updated: Option<String>,
    pub update_status: Option<String>,
}

/// New cached batch row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::tools_weekly_cache)]
pub struct NewBatchCacheRow<'a> {
    pub id: &'a str,
    pub category: &'a str,
    pub tools_data: &'a str,
    pub total_products: i32,
    pub created_at: &'a str,
    pub expires_at: &'a str,
    pub last_updated: Option<&'a str>,
    pub update_status: Option<&'a str>,
}
