/*
 * Responsibility
 * - 管理者向け一覧 API の検索仕様（projection）の型
 * - filter / include / fields / limit の 4 要素を固定化する
 *
 * Notes
 * - filter の値は serde_json::Value のまま持つ（型の解釈は facade/repo 側の責務）
 * - デコードのロジックは ./core.rs
 */
use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// What subset/shape of records a list query should return.
///
/// Built once per request from the raw `searchCriteria` query parameter and
/// consumed by the user facade; an absent parameter is the same as `{}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    /// Equality filters: field name -> expected value (keys unique).
    pub filter: BTreeMap<String, Value>,
    /// Relation names to eagerly attach.
    pub include: Vec<String>,
    /// Field names to restrict the response to (empty = all fields).
    pub fields: Vec<String>,
    /// Optional upper bound on result count.
    pub limit: Option<i64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SearchCriteriaError {
    #[error("searchCriteria is not a JSON object: {0}")]
    Undecodable(String),
    #[error("searchCriteria \"{key}\" has an unexpected shape")]
    InvalidControl { key: &'static str },
}
