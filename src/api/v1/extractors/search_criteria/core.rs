/*
 * Responsibility
 * - searchCriteria クエリ文字列 → SearchCriteria への変換ロジック
 * - Axum の FromRequestParts 実装
 * - デコード失敗は 400 (BadRequest) へ変換（filter を組み立てる前に fail fast）
 */
use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::Value;

use crate::api::v1::extractors::search_criteria::types::{SearchCriteria, SearchCriteriaError};
use crate::error::AppError;

/// Decode an optional raw `searchCriteria` string.
///
/// - absent -> the empty projection (same as parsing `{}`)
/// - present -> must be a JSON object; `include` / `fields` / `limit` are
///   pulled out as projection controls, every remaining key becomes an
///   equality filter entry untouched
pub fn parse(raw: Option<&str>) -> Result<SearchCriteria, SearchCriteriaError> {
    let Some(raw) = raw else {
        return Ok(SearchCriteria::default());
    };

    let value: Value =
        serde_json::from_str(raw).map_err(|e| SearchCriteriaError::Undecodable(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(SearchCriteriaError::Undecodable(
            "expected a JSON object".to_string(),
        ));
    };

    let mut criteria = SearchCriteria::default();
    for (key, value) in map {
        match key.as_str() {
            "include" => criteria.include = string_list("include", value)?,
            "fields" => criteria.fields = string_list("fields", value)?,
            "limit" => criteria.limit = Some(limit_value(value)?),
            _ => {
                criteria.filter.insert(key, value);
            }
        }
    }

    Ok(criteria)
}

fn string_list(key: &'static str, value: Value) -> Result<Vec<String>, SearchCriteriaError> {
    let Value::Array(items) = value else {
        return Err(SearchCriteriaError::InvalidControl { key });
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(SearchCriteriaError::InvalidControl { key }),
        })
        .collect()
}

fn limit_value(value: Value) -> Result<i64, SearchCriteriaError> {
    value
        .as_u64()
        .and_then(|n| i64::try_from(n).ok())
        .ok_or(SearchCriteriaError::InvalidControl { key: "limit" })
}

impl<S> FromRequestParts<S> for SearchCriteria
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts.uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "searchCriteria")
                .map(|(_, value)| value.into_owned())
        });

        parse(raw.as_deref()).map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::FromRequestParts, http::Request};
    use serde_json::json;

    use super::parse;
    use crate::api::v1::extractors::search_criteria::types::{SearchCriteria, SearchCriteriaError};

    #[test]
    fn absent_criteria_equals_the_empty_object() {
        let absent = parse(None).unwrap();
        let empty = parse(Some("{}")).unwrap();

        assert_eq!(absent, empty);
        assert!(absent.filter.is_empty());
        assert!(absent.include.is_empty());
        assert!(absent.fields.is_empty());
        assert_eq!(absent.limit, None);
    }

    #[test]
    fn reserved_keys_become_controls_and_the_rest_becomes_filter() {
        let criteria = parse(Some(
            r#"{"include":["sessions"],"fields":["email"],"limit":5,"a":1,"b":"x"}"#,
        ))
        .unwrap();

        assert_eq!(criteria.include, vec!["sessions".to_string()]);
        assert_eq!(criteria.fields, vec!["email".to_string()]);
        assert_eq!(criteria.limit, Some(5));
        assert_eq!(criteria.filter.len(), 2);
        assert_eq!(criteria.filter.get("a"), Some(&json!(1)));
        assert_eq!(criteria.filter.get("b"), Some(&json!("x")));
        for key in ["include", "fields", "limit"] {
            assert!(!criteria.filter.contains_key(key));
        }
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = r#"{"status":"active","limit":3,"include":["sessions"],"fields":["email","name"]}"#;
        assert_eq!(parse(Some(raw)).unwrap(), parse(Some(raw)).unwrap());
    }

    #[test]
    fn undecodable_criteria_fail_before_any_filter_is_built() {
        assert!(matches!(
            parse(Some("{not json")),
            Err(SearchCriteriaError::Undecodable(_))
        ));
        assert!(matches!(
            parse(Some("[1,2,3]")),
            Err(SearchCriteriaError::Undecodable(_))
        ));
    }

    #[test]
    fn controls_with_the_wrong_shape_are_rejected() {
        assert_eq!(
            parse(Some(r#"{"include":"sessions"}"#)).unwrap_err(),
            SearchCriteriaError::InvalidControl { key: "include" }
        );
        assert_eq!(
            parse(Some(r#"{"fields":[1]}"#)).unwrap_err(),
            SearchCriteriaError::InvalidControl { key: "fields" }
        );
        assert_eq!(
            parse(Some(r#"{"limit":-2}"#)).unwrap_err(),
            SearchCriteriaError::InvalidControl { key: "limit" }
        );
    }

    #[tokio::test]
    async fn extractor_reads_the_search_criteria_parameter() {
        let raw = r#"{"include":["sessions"],"fields":["email"],"limit":5,"status":"active"}"#;
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("searchCriteria", raw)
            .finish();

        let request = Request::builder()
            .uri(format!("/api/v1/users?{query}"))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let criteria = SearchCriteria::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(criteria.include, vec!["sessions".to_string()]);
        assert_eq!(criteria.fields, vec!["email".to_string()]);
        assert_eq!(criteria.limit, Some(5));
        assert_eq!(criteria.filter.get("status"), Some(&json!("active")));
    }

    #[tokio::test]
    async fn extractor_without_the_parameter_yields_the_empty_projection() {
        let request = Request::builder().uri("/api/v1/users").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let criteria = SearchCriteria::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(criteria, SearchCriteria::default());
    }
}
