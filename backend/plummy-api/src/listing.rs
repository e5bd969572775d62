//! Paginated, sortable, filterable listings for the account tables.
//!
//! A [`ListingSchema`] whitelists what a listing may sort and filter on; the
//! query-string values only ever reach SQL as bound parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::{AppError, Result};
use crate::utils::contains_pattern;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page whose offset still fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Raw query-string parameters, kept as strings so bad numbers fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub filters: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(SortOrder::Desc),
            Some(s) if s.eq_ignore_ascii_case("desc") => Ok(SortOrder::Desc),
            Some(s) if s.eq_ignore_ascii_case("asc") => Ok(SortOrder::Asc),
            Some(other) => Err(AppError::BadRequest(format!(
                "Invalid sortOrder '{}': expected 'asc' or 'desc'",
                other
            ))),
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-insensitive substring match.
    Contains,
    /// Equality for a string, `ANY` for an array of strings.
    Exact,
}

/// Filter key as sent by the client, its kind, and the SQL column it targets.
pub type FilterSpec = (&'static str, FilterKind, &'static str);

#[derive(Debug)]
pub struct ListingSchema {
    pub select: &'static str,
    pub from: &'static str,
    /// Client sort key -> SQL column.
    pub sortable: &'static [(&'static str, &'static str)],
    pub filters: &'static [FilterSpec],
    pub search_columns: &'static [&'static str],
}

impl ListingSchema {
    fn sort_column(&self, key: &str) -> Option<&'static str> {
        self.sortable
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, column)| *column)
    }
}

pub const USER_LISTING: ListingSchema = ListingSchema {
    select: "u.id, u.first_name, u.middle_name, u.last_name, u.role_id, u.email, u.created_at, \
             r.title AS role_title",
    from: "users u LEFT JOIN roles r ON r.id = u.role_id",
    sortable: &[
        ("email", "u.email"),
        ("firstName", "u.first_name"),
        ("middleName", "u.middle_name"),
        ("lastName", "u.last_name"),
        ("createdAt", "u.created_at"),
        ("roleTitle", "r.title"),
    ],
    filters: &[
        ("email", FilterKind::Contains, "u.email"),
        ("firstName", FilterKind::Contains, "u.first_name"),
        ("lastName", FilterKind::Contains, "u.last_name"),
        ("roleTitle", FilterKind::Exact, "r.title"),
    ],
    search_columns: &["u.email", "u.first_name", "u.last_name", "r.title"],
};

pub const ROLE_LISTING: ListingSchema = ListingSchema {
    select: "ro.id, ro.title, ro.position, ro.created_at, \
             c.first_name AS creator_first_name, c.middle_name AS creator_middle_name, \
             c.last_name AS creator_last_name",
    from: "roles ro LEFT JOIN users c ON c.id = ro.created_by_id",
    sortable: &[
        ("title", "ro.title"),
        ("position", "ro.position"),
        ("createdAt", "ro.created_at"),
    ],
    filters: &[("title", FilterKind::Contains, "ro.title")],
    search_columns: &["ro.title"],
};

/// Normalized listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: i64,
    pub page_size: i64,
    pub sort_column: &'static str,
    pub sort_order: SortOrder,
    pub filters: Map<String, Value>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn parse(params: &ListParams, schema: &ListingSchema) -> Result<Self> {
        let page = parse_positive(params.page.as_deref()).unwrap_or(1).min(MAX_PAGE);
        let page_size = parse_positive(params.page_size.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        let sort_key = params
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("createdAt");
        let sort_column = schema
            .sort_column(sort_key)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid sortBy '{}'", sort_key)))?;

        let sort_order = SortOrder::parse(params.sort_order.as_deref())?;

        let filters = match params.filters.as_deref().map(str::trim) {
            None | Some("") => Map::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => return Err(AppError::BadRequest("filters must be a JSON object".to_string())),
            },
        };

        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            page,
            page_size,
            sort_column,
            sort_order,
            filters,
            search,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).filter(|n| *n > 0)
}

/// Appends `WHERE (field filters) AND (global search)` to `qb`.
fn push_where(qb: &mut QueryBuilder<'static, Postgres>, schema: &ListingSchema, query: &ListQuery) {
    qb.push(" WHERE TRUE");

    for (key, kind, column) in schema.filters {
        let Some(value) = query.filters.get(*key) else {
            continue;
        };
        match (kind, value) {
            (FilterKind::Contains, Value::String(s)) if !s.is_empty() => {
                qb.push(" AND ")
                    .push(*column)
                    .push(" ILIKE ")
                    .push_bind(contains_pattern(s));
            }
            (FilterKind::Exact, Value::String(s)) if !s.is_empty() => {
                qb.push(" AND ").push(*column).push(" = ").push_bind(s.clone());
            }
            (FilterKind::Exact, Value::Array(items)) => {
                let values: Vec<String> = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if !values.is_empty() {
                    qb.push(" AND ").push(*column).push(" = ANY(").push_bind(values).push(")");
                }
            }
            _ => {}
        }
    }

    if let Some(search) = &query.search {
        let pattern = contains_pattern(search);
        qb.push(" AND (");
        for (i, column) in schema.search_columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

pub fn build_select(schema: &ListingSchema, query: &ListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", schema.select, schema.from));
    push_where(&mut qb, schema, query);
    qb.push(format!(
        " ORDER BY {} {}",
        query.sort_column,
        query.sort_order.as_sql()
    ));
    qb.push(" LIMIT ").push_bind(query.page_size);
    qb.push(" OFFSET ").push_bind(query.offset());
    qb
}

pub fn build_count(schema: &ListingSchema, query: &ListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", schema.from));
    push_where(&mut qb, schema, query);
    qb
}

/// Runs the page query and the matching count query.
pub async fn fetch_page<R>(pool: &PgPool, schema: &ListingSchema, query: &ListQuery) -> Result<(Vec<R>, i64)>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let rows = build_select(schema, query)
        .build_query_as::<R>()
        .fetch_all(pool)
        .await?;
    let total = build_count(schema, query)
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;
    Ok((rows, total))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total_count: i64, query: &ListQuery) -> Self {
        Self {
            data,
            total_count,
            page: query.page,
            page_size: query.page_size,
            total_pages: total_pages(total_count, query.page_size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

pub fn total_pages(total_count: i64, page_size: i64) -> i64 {
    if total_count <= 0 || page_size <= 0 {
        0
    } else {
        (total_count + page_size - 1) / page_size
    }
}

/// `skip`/`take` window for feed-style endpoints. Unparsable or zero `take`
/// falls back to the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Window {
    pub skip: Option<String>,
    pub take: Option<String>,
}

impl Window {
    pub fn resolve(&self, default_take: i64, max_take: i64) -> (i64, i64) {
        let skip = self
            .skip
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n >= 0)
            .unwrap_or(0);
        let take = parse_positive(self.take.as_deref())
            .unwrap_or(default_take)
            .min(max_take);
        (skip, take)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut p = ListParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "page" => p.page = v,
                "pageSize" => p.page_size = v,
                "sortBy" => p.sort_by = v,
                "sortOrder" => p.sort_order = v,
                "filters" => p.filters = v,
                "search" => p.search = v,
                _ => unreachable!(),
            }
        }
        p
    }

    #[test]
    fn defaults_apply() {
        let q = ListQuery::parse(&ListParams::default(), &USER_LISTING).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 10);
        assert_eq!(q.sort_column, "u.created_at");
        assert_eq!(q.sort_order, SortOrder::Desc);
        assert!(q.filters.is_empty());
        assert_eq!(q.search, None);
    }

    #[test]
    fn bad_numbers_fall_back_and_page_size_is_clamped() {
        let q = ListQuery::parse(&params(&[("page", "-3"), ("pageSize", "500")]), &USER_LISTING).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, MAX_PAGE_SIZE);

        let q = ListQuery::parse(&params(&[("page", "abc"), ("pageSize", "0")]), &USER_LISTING).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, DEFAULT_PAGE_SIZE);

        let q = ListQuery::parse(&params(&[("page", "3"), ("pageSize", "25")]), &USER_LISTING).unwrap();
        assert_eq!(q.offset(), 50);
    }

    #[test]
    fn huge_page_numbers_keep_the_offset_in_range() {
        let q = ListQuery::parse(&params(&[("page", "9223372036854775807"), ("pageSize", "10")]), &USER_LISTING)
            .unwrap();
        assert_eq!(q.page, MAX_PAGE);
        assert!(q.offset() > 0);
        assert_eq!(q.offset(), (MAX_PAGE - 1) * 10);

        let q = ListQuery::parse(&params(&[("page", "9223372036854775807"), ("pageSize", "100")]), &USER_LISTING)
            .unwrap();
        assert!(q.offset() > 0);
    }

    #[test]
    fn unknown_sort_is_rejected() {
        let err = ListQuery::parse(&params(&[("sortBy", "hashedPassword")]), &USER_LISTING).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = ListQuery::parse(&params(&[("sortOrder", "sideways")]), &USER_LISTING).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn role_title_sort_targets_the_join() {
        let q = ListQuery::parse(&params(&[("sortBy", "roleTitle"), ("sortOrder", "asc")]), &USER_LISTING).unwrap();
        let qb = build_select(&USER_LISTING, &q);
        let sql = qb.sql();
        assert!(sql.contains("ORDER BY r.title ASC"), "{}", sql);
    }

    #[test]
    fn filters_must_be_an_object() {
        for raw in ["[1,2]", "not json", "\"email\""] {
            let err = ListQuery::parse(&params(&[("filters", raw)]), &USER_LISTING).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{}", raw);
        }
    }

    #[test]
    fn filters_and_search_combine() {
        let q = ListQuery::parse(
            &params(&[
                ("filters", r#"{"email":"ada","roleTitle":["Manager","User"],"nickname":"x","lastName":""}"#),
                ("search", "love"),
            ]),
            &USER_LISTING,
        )
        .unwrap();
        let qb = build_count(&USER_LISTING, &q);
        let sql = qb.sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE TRUE \
             AND u.email ILIKE $1 AND r.title = ANY($2) \
             AND (u.email ILIKE $3 OR u.first_name ILIKE $4 OR u.last_name ILIKE $5 OR r.title ILIKE $6)"
        );
    }

    #[test]
    fn single_role_title_is_exact() {
        let q = ListQuery::parse(&params(&[("filters", r#"{"roleTitle":"Manager"}"#)]), &USER_LISTING).unwrap();
        let qb = build_count(&USER_LISTING, &q);
        let sql = qb.sql();
        assert!(sql.ends_with("WHERE TRUE AND r.title = $1"), "{}", sql);
    }

    #[test]
    fn role_listing_select_binds_paging_last() {
        let q = ListQuery::parse(&params(&[("search", "man"), ("sortBy", "position")]), &ROLE_LISTING).unwrap();
        let qb = build_select(&ROLE_LISTING, &q);
        let sql = qb.sql();
        assert!(sql.contains("AND (ro.title ILIKE $1)"), "{}", sql);
        assert!(sql.ends_with("ORDER BY ro.position DESC LIMIT $2 OFFSET $3"), "{}", sql);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(1, 100), 1);
    }

    #[test]
    fn window_defaults() {
        let w = Window::default();
        assert_eq!(w.resolve(5, 50), (0, 5));
        let w = Window { skip: Some("10".into()), take: Some("500".into()) };
        assert_eq!(w.resolve(5, 50), (10, 50));
        let w = Window { skip: Some("-1".into()), take: Some("0".into()) };
        assert_eq!(w.resolve(5, 50), (0, 5));
    }
}
