//! List parameters, pagination math, and query-string parsing.
//!
//! Lives in `core` so the HTTP layer can validate a raw query against a
//! resource's list schema and the repository layer can turn the resulting
//! [`ListParams`] into SQL, without either depending on the other.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{CoreError, FieldError};
use crate::types::Date;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE: i64 = 1;

pub const DEFAULT_LIMIT: i64 = 10;

/// Upper bound on page size; larger requests are rejected at the boundary
/// and clamped again by the provider.
pub const MAX_LIMIT: i64 = 100;

/// Highest page whose offset still fits in an `i64` at [`MAX_LIMIT`].
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// Query keys with fixed meaning on every list endpoint.
const RESERVED_KEYS: &[&str] = &["page", "limit", "search", "sortBy", "sortOrder"];

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided page number to `[1, MAX_PAGE]`.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Case-insensitive `asc` / `desc`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// How a filter's raw query-string value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Positive integer id (relation equality).
    Id,
    /// Positive integer id, or the literal `null` meaning "IS NULL".
    NullableId,
    /// `"true"` or `"false"`.
    Bool,
    /// `YYYY-MM-DD`.
    Date,
    /// One of a fixed set of values (e.g. contract status).
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Null,
    Int(i64),
    Bool(bool),
    Date(Date),
    Text(String),
}

impl FilterKind {
    fn parse(self, raw: &str) -> Result<FilterValue, String> {
        let raw = raw.trim();
        match self {
            FilterKind::Id => parse_id(raw).map(FilterValue::Int),
            FilterKind::NullableId => {
                if raw.eq_ignore_ascii_case("null") {
                    Ok(FilterValue::Null)
                } else {
                    parse_id(raw).map(FilterValue::Int)
                }
            }
            FilterKind::Bool => match raw {
                "true" => Ok(FilterValue::Bool(true)),
                "false" => Ok(FilterValue::Bool(false)),
                _ => Err("Must be 'true' or 'false'".to_string()),
            },
            FilterKind::Date => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(FilterValue::Date)
                .map_err(|_| "Must be a date in YYYY-MM-DD format".to_string()),
            FilterKind::Enum(allowed) => {
                if allowed.contains(&raw) {
                    Ok(FilterValue::Text(raw.to_string()))
                } else {
                    Err(format!("Must be one of: {}", allowed.join(", ")))
                }
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, String> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err("Must be a positive integer id".to_string()),
    }
}

/// The list surface a resource exposes: which filter keys it accepts and
/// which fields it can sort on.
pub trait ListSchema {
    fn filter_kind(&self, key: &str) -> Option<FilterKind>;
    fn is_sortable(&self, field: &str) -> bool;
}

// ---------------------------------------------------------------------------
// ListParams
// ---------------------------------------------------------------------------

/// Validated list request: pagination, optional text search, AND-combined
/// filters, and an optional sort (resource default applies when `None`).
///
/// `order` carries a bare `sortOrder`; it applies to the resource's default
/// sort field when no `sortBy` was given.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub filters: BTreeMap<String, FilterValue>,
    pub sort: Option<Sort>,
    pub order: Option<SortDirection>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            filters: BTreeMap::new(),
            sort: None,
            order: None,
        }
    }
}

impl ListParams {
    pub fn with_filter(mut self, key: &str, value: FilterValue) -> Self {
        self.filters.insert(key.to_string(), value);
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn with_page(mut self, page: i64, limit: i64) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    /// Effective page size after clamping to `[1, MAX_LIMIT]`.
    pub fn effective_limit(&self) -> i64 {
        clamp_limit(Some(self.limit), DEFAULT_LIMIT, MAX_LIMIT)
    }

    pub fn effective_page(&self) -> i64 {
        clamp_page(Some(self.page))
    }

    pub fn offset(&self) -> i64 {
        (self.effective_page() - 1) * self.effective_limit()
    }

    /// The search term, if it has any non-whitespace content.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Parse a raw query map into [`ListParams`] against a resource schema.
///
/// Every failing key is reported, not just the first.
pub fn parse_list_query(
    raw: &HashMap<String, String>,
    schema: &dyn ListSchema,
) -> Result<ListParams, CoreError> {
    let mut params = ListParams::default();
    let mut errors = Vec::new();

    if let Some(page) = raw.get("page") {
        match page.trim().parse::<i64>() {
            Ok(p) if (1..=MAX_PAGE).contains(&p) => params.page = p,
            _ => errors.push(FieldError::new(
                "page",
                format!("Must be an integer between 1 and {MAX_PAGE}"),
            )),
        }
    }

    if let Some(limit) = raw.get("limit") {
        match limit.trim().parse::<i64>() {
            Ok(l) if (1..=MAX_LIMIT).contains(&l) => params.limit = l,
            _ => errors.push(FieldError::new(
                "limit",
                format!("Must be an integer between 1 and {MAX_LIMIT}"),
            )),
        }
    }

    if let Some(search) = raw.get("search") {
        let trimmed = search.trim();
        if !trimmed.is_empty() {
            params.search = Some(trimmed.to_string());
        }
    }

    let direction = match raw.get("sortOrder") {
        Some(order) => match SortDirection::parse(order.trim()) {
            Some(d) => Some(d),
            None => {
                errors.push(FieldError::new("sortOrder", "Must be 'asc' or 'desc'"));
                None
            }
        },
        None => None,
    };

    params.order = direction;

    if let Some(field) = raw.get("sortBy") {
        let field = field.trim();
        if schema.is_sortable(field) {
            params.sort = Some(Sort {
                field: field.to_string(),
                direction: direction.unwrap_or(SortDirection::Asc),
            });
        } else {
            errors.push(FieldError::new(
                "sortBy",
                format!("Cannot sort by '{field}'"),
            ));
        }
    }

    for (key, value) in raw {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        match schema.filter_kind(key) {
            Some(kind) => match kind.parse(value) {
                Ok(v) => {
                    params.filters.insert(key.clone(), v);
                }
                Err(message) => errors.push(FieldError::new(key.clone(), message)),
            },
            None => errors.push(FieldError::new(key.clone(), "Unknown query parameter")),
        }
    }

    if errors.is_empty() {
        Ok(params)
    } else {
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Err(CoreError::InvalidFields(errors))
    }
}

// ---------------------------------------------------------------------------
// Paginated responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// `pages` is `ceil(total / limit)`; zero rows means zero pages.
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        let total = total.max(0);
        Self {
            total,
            pages: (total + limit - 1) / limit,
            page,
            limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const STATUSES: &[&str] = &["ACTIVE", "EXPIRED"];

    struct TestSchema;

    impl ListSchema for TestSchema {
        fn filter_kind(&self, key: &str) -> Option<FilterKind> {
            match key {
                "clientId" => Some(FilterKind::Id),
                "parentId" => Some(FilterKind::NullableId),
                "isActive" => Some(FilterKind::Bool),
                "endDateBefore" => Some(FilterKind::Date),
                "status" => Some(FilterKind::Enum(STATUSES)),
                _ => None,
            }
        }

        fn is_sortable(&self, field: &str) -> bool {
            matches!(field, "name" | "createdAt")
        }
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn failing_fields(result: Result<ListParams, CoreError>) -> Vec<String> {
        match result {
            Err(CoreError::InvalidFields(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    // -- defaults ------------------------------------------------------------

    #[test]
    fn empty_query_uses_defaults() {
        let params = parse_list_query(&HashMap::new(), &TestSchema).unwrap();
        assert_eq!(params, ListParams::default());
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert!(params.sort.is_none());
    }

    #[test]
    fn blank_search_means_no_text_filter() {
        let params = parse_list_query(&query(&[("search", "   ")]), &TestSchema).unwrap();
        assert_eq!(params.search, None);
        assert_eq!(params.search_term(), None);
    }

    #[test]
    fn search_is_trimmed() {
        let params = parse_list_query(&query(&[("search", "  acme ")]), &TestSchema).unwrap();
        assert_eq!(params.search_term(), Some("acme"));
    }

    // -- pagination bounds ---------------------------------------------------

    #[test]
    fn limit_above_max_is_rejected() {
        let fields = failing_fields(parse_list_query(&query(&[("limit", "101")]), &TestSchema));
        assert_eq!(fields, vec!["limit"]);
    }

    #[test]
    fn limit_at_max_is_accepted() {
        let params = parse_list_query(&query(&[("limit", "100")]), &TestSchema).unwrap();
        assert_eq!(params.limit, 100);
    }

    #[test]
    fn zero_or_negative_page_is_rejected() {
        assert_eq!(failing_fields(parse_list_query(&query(&[("page", "0")]), &TestSchema)), vec!["page"]);
        assert_eq!(failing_fields(parse_list_query(&query(&[("page", "-3")]), &TestSchema)), vec!["page"]);
        assert_eq!(failing_fields(parse_list_query(&query(&[("page", "two")]), &TestSchema)), vec!["page"]);
    }

    #[test]
    fn page_past_offset_range_is_rejected() {
        let huge = i64::MAX.to_string();
        let fields = failing_fields(parse_list_query(&query(&[("page", huge.as_str())]), &TestSchema));
        assert_eq!(fields, vec!["page"]);

        let last = MAX_PAGE.to_string();
        let params = parse_list_query(&query(&[("page", last.as_str()), ("limit", "100")]), &TestSchema)
            .unwrap();
        assert_eq!(params.offset(), (MAX_PAGE - 1) * MAX_LIMIT);
    }

    #[test]
    fn offset_never_overflows() {
        let params = ListParams::default().with_page(i64::MAX, i64::MAX);
        assert_eq!(params.effective_page(), MAX_PAGE);
        assert!(params.offset() > 0);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let params = ListParams::default().with_page(3, 25);
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn effective_limit_is_clamped() {
        assert_eq!(ListParams::default().with_page(1, 500).effective_limit(), 100);
        assert_eq!(ListParams::default().with_page(1, 0).effective_limit(), 1);
    }

    // -- every failing field is reported ------------------------------------

    #[test]
    fn all_failures_are_collected() {
        let fields = failing_fields(parse_list_query(
            &query(&[
                ("page", "0"),
                ("limit", "1000"),
                ("sortBy", "password"),
                ("sortOrder", "sideways"),
                ("status", "BOGUS"),
                ("isActive", "yes"),
                ("mystery", "1"),
            ]),
            &TestSchema,
        ));
        assert_eq!(
            fields,
            vec!["isActive", "limit", "mystery", "page", "sortBy", "sortOrder", "status"]
        );
    }

    // -- filters -------------------------------------------------------------

    #[test]
    fn boolean_strings_become_booleans() {
        let params = parse_list_query(&query(&[("isActive", "false")]), &TestSchema).unwrap();
        assert_eq!(params.filters.get("isActive"), Some(&FilterValue::Bool(false)));
    }

    #[test]
    fn enum_filter_accepts_known_value() {
        let params = parse_list_query(&query(&[("status", "ACTIVE")]), &TestSchema).unwrap();
        assert_eq!(
            params.filters.get("status"),
            Some(&FilterValue::Text("ACTIVE".to_string()))
        );
    }

    #[test]
    fn nullable_id_accepts_null_literal() {
        let params = parse_list_query(&query(&[("parentId", "null")]), &TestSchema).unwrap();
        assert_eq!(params.filters.get("parentId"), Some(&FilterValue::Null));
    }

    #[test]
    fn plain_id_rejects_null_literal() {
        let fields = failing_fields(parse_list_query(&query(&[("clientId", "null")]), &TestSchema));
        assert_eq!(fields, vec!["clientId"]);
    }

    #[test]
    fn date_filter_parses_iso_dates() {
        let params =
            parse_list_query(&query(&[("endDateBefore", "2025-01-31")]), &TestSchema).unwrap();
        assert_matches!(params.filters.get("endDateBefore"), Some(FilterValue::Date(_)));
    }

    // -- sorting -------------------------------------------------------------

    #[test]
    fn sort_defaults_to_ascending() {
        let params = parse_list_query(&query(&[("sortBy", "name")]), &TestSchema).unwrap();
        assert_eq!(
            params.sort,
            Some(Sort { field: "name".into(), direction: SortDirection::Asc })
        );
    }

    #[test]
    fn bare_sort_order_is_kept_for_the_default_field() {
        let params = parse_list_query(&query(&[("sortOrder", "asc")]), &TestSchema).unwrap();
        assert!(params.sort.is_none());
        assert_eq!(params.order, Some(SortDirection::Asc));
    }

    #[test]
    fn sort_order_is_case_insensitive() {
        let params = parse_list_query(
            &query(&[("sortBy", "createdAt"), ("sortOrder", "DESC")]),
            &TestSchema,
        )
        .unwrap();
        assert_eq!(params.sort.unwrap().direction, SortDirection::Desc);
    }

    // -- pagination math -----------------------------------------------------

    #[test]
    fn pages_is_ceiling_of_total_over_limit() {
        assert_eq!(Pagination::new(0, 1, 10).pages, 0);
        assert_eq!(Pagination::new(1, 1, 10).pages, 1);
        assert_eq!(Pagination::new(10, 1, 10).pages, 1);
        assert_eq!(Pagination::new(11, 1, 10).pages, 2);
        assert_eq!(Pagination::new(250, 1, 100).pages, 3);
    }

    #[test]
    fn pages_property_holds_over_a_range() {
        for total in 0..300 {
            for limit in 1..=25 {
                let p = Pagination::new(total, 1, limit);
                assert_eq!(p.pages, (total as f64 / limit as f64).ceil() as i64);
            }
        }
    }

    // -- helpers -------------------------------------------------------------

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn clamp_limit_behaviour() {
        assert_eq!(clamp_limit(None, 10, 100), 10);
        assert_eq!(clamp_limit(Some(200), 10, 100), 100);
        assert_eq!(clamp_limit(Some(-5), 10, 100), 1);
    }
}
