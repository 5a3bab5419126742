/*
 * Responsibility
 * - users テーブル向け SQLx 操作
 * - PgPool を受け取り CRUD と動的 filter 検索を提供
 * - filter のカラムは allowlist で固定（それ以外は RepoError）
 */
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::repos::error::RepoError;

const SELECT_COLUMNS: &str = r#"
    "userId", "firebaseUid", "userEmail", "userName", "userStatus",
    "isSuperAdmin", "createdAt", "updatedAt"
"#;

/// Filter keys accepted from search criteria, mapped to their column and type.
/// Values outside this list never reach SQL.
const FILTER_COLUMNS: &[(&str, &str, ColumnKind)] = &[
    ("email", "userEmail", ColumnKind::Text),
    ("name", "userName", ColumnKind::Text),
    ("status", "userStatus", ColumnKind::Text),
    ("firebase_uid", "firebaseUid", ColumnKind::Text),
    ("is_super_admin", "isSuperAdmin", ColumnKind::Bool),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Bool,
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    #[sqlx(rename = "userId")]
    pub id: Uuid,
    #[sqlx(rename = "firebaseUid")]
    pub firebase_uid: String,
    #[sqlx(rename = "userEmail")]
    pub email: String,
    #[sqlx(rename = "userName")]
    pub name: String,
    #[sqlx(rename = "userStatus")]
    pub status: String,
    #[sqlx(rename = "isSuperAdmin")]
    pub is_super_admin: bool,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

pub async fn create(
    db: &PgPool,
    firebase_uid: &str,
    email: &str,
    name: &str,
) -> Result<UserRow, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users ("firebaseUid", "userEmail", "userName")
        VALUES ($1, $2, $3)
        RETURNING {SELECT_COLUMNS}
        "#
    ))
    .bind(firebase_uid)
    .bind(email)
    .bind(name)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn get_by_firebase_uid(
    db: &PgPool,
    firebase_uid: &str,
) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM users
        WHERE "firebaseUid" = $1
        "#
    ))
    .bind(firebase_uid)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
    status: Option<&str>,
) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users
        SET
            "userName" = COALESCE($2, "userName"),
            "userStatus" = COALESCE($3, "userStatus"),
            "updatedAt" = now()
        WHERE "userId" = $1
        RETURNING {SELECT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(status)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Delete a user row, returning it when it existed.
pub async fn delete_by_id(db: &PgPool, user_id: Uuid) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        DELETE FROM users
        WHERE "userId" = $1
        RETURNING {SELECT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Dynamic equality search over the allowlisted columns.
pub async fn find(
    db: &PgPool,
    filter: &BTreeMap<String, Value>,
    limit: Option<i64>,
) -> Result<Vec<UserRow>, RepoError> {
    let mut qb = build_find(filter, limit)?;
    let rows = qb.build_query_as::<UserRow>().fetch_all(db).await?;

    Ok(rows)
}

/// Test-data cleanup: remove every cypress user in one round trip.
pub async fn delete_cypress_test_users(db: &PgPool) -> Result<Vec<UserRow>, RepoError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        DELETE FROM users
        WHERE "userEmail" LIKE 'cypress%'
        RETURNING {SELECT_COLUMNS}
        "#
    ))
    .fetch_all(db)
    .await?;

    Ok(rows)
}

enum BindValue {
    Text(String),
    Flag(bool),
}

/// Coerce a JSON filter value to the column's type.
///
/// The search criteria come in as untyped JSON, so "active", 1 or true may
/// show up for any column; the column decides what is acceptable.
fn coerce(kind: ColumnKind, value: &Value) -> Option<BindValue> {
    match (kind, value) {
        (ColumnKind::Text, Value::String(s)) => Some(BindValue::Text(s.clone())),
        (ColumnKind::Text, Value::Number(n)) => Some(BindValue::Text(n.to_string())),
        (ColumnKind::Text, Value::Bool(b)) => Some(BindValue::Text(b.to_string())),
        (ColumnKind::Bool, Value::Bool(b)) => Some(BindValue::Flag(*b)),
        (ColumnKind::Bool, Value::String(s)) if s == "true" || s == "false" => {
            Some(BindValue::Flag(s == "true"))
        }
        _ => None,
    }
}

fn build_find(
    filter: &BTreeMap<String, Value>,
    limit: Option<i64>,
) -> Result<QueryBuilder<'static, Postgres>, RepoError> {
    let mut qb = QueryBuilder::new(format!(
        r#"SELECT {SELECT_COLUMNS} FROM users WHERE TRUE"#
    ));

    for (key, value) in filter {
        let Some((_, column, kind)) = FILTER_COLUMNS.iter().find(|(name, ..)| *name == key) else {
            return Err(RepoError::UnknownFilterField(key.clone()));
        };
        let Some(bind) = coerce(*kind, value) else {
            return Err(RepoError::InvalidFilterValue(key.clone()));
        };

        // column comes from the allowlist above, never from the caller
        qb.push(format!(r#" AND "{column}" = "#));
        match bind {
            BindValue::Text(s) => qb.push_bind(s),
            BindValue::Flag(b) => qb.push_bind(b),
        };
    }

    qb.push(r#" ORDER BY "createdAt" DESC"#);

    if let Some(limit) = limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }

    Ok(qb)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::collections::BTreeMap;

    use super::build_find;
    use crate::repos::error::RepoError;

    fn filter(entries: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn empty_filter_selects_everything() {
        let mut qb = build_find(&BTreeMap::new(), None).unwrap();
        let sql = qb.sql();

        assert!(sql.contains("FROM users WHERE TRUE"));
        assert!(sql.contains(r#"ORDER BY "createdAt" DESC"#));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn filter_keys_map_to_quoted_columns_with_binds() {
        let mut qb = build_find(
            &filter(&[("status", json!("active")), ("is_super_admin", json!(true))]),
            Some(5),
        )
        .unwrap();
        let sql = qb.sql();

        assert!(sql.contains(r#""userStatus" = $"#));
        assert!(sql.contains(r#""isSuperAdmin" = $"#));
        assert!(sql.contains("LIMIT $"));
        // values are always bound, never spliced
        assert!(!sql.contains("active"));
    }

    #[test]
    fn unknown_filter_field_is_rejected() {
        let err = build_find(&filter(&[("password", json!("x"))]), None).err().unwrap();
        assert!(matches!(err, RepoError::UnknownFilterField(field) if field == "password"));
    }

    #[test]
    fn filter_values_are_coerced_to_the_column_type() {
        // boolean column accepts "true"/"false" strings
        assert!(build_find(&filter(&[("is_super_admin", json!("false"))]), None).is_ok());
        // but not arbitrary text or numbers
        let err =
            build_find(&filter(&[("is_super_admin", json!("yes"))]), None).err().unwrap();
        assert!(matches!(err, RepoError::InvalidFilterValue(_)));
        let err = build_find(&filter(&[("is_super_admin", json!(1))]), None).err().unwrap();
        assert!(matches!(err, RepoError::InvalidFilterValue(_)));

        // text columns take strings and stringified scalars
        assert!(build_find(&filter(&[("name", json!("Ada"))]), None).is_ok());
        assert!(build_find(&filter(&[("name", json!(42))]), None).is_ok());
        // objects and arrays are never valid equality operands
        let err = build_find(&filter(&[("name", json!({"a": 1}))]), None).err().unwrap();
        assert!(matches!(err, RepoError::InvalidFilterValue(_)));
    }
}
