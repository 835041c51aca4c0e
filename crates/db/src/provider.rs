//! Generic list/get/delete provider driven by a declarative config.
//!
//! Each resource declares its FROM clause (including relation joins), the
//! columns searched by `?search=`, the filter keys it accepts, its sortable
//! fields, and a row -> model transform. [`Provider`] turns a validated
//! [`ListParams`] into a filtered, sorted, paginated query plus a matching
//! COUNT, and returns a [`PaginatedResponse`].
//!
//! Create and update differ per table and live in the repositories.

use clientdesk_core::listing::{
    escape_like, FilterKind, FilterValue, ListParams, ListSchema, PaginatedResponse, Pagination,
    SortDirection,
};
use clientdesk_core::types::{Date, DbId};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{FromRow, PgPool, Postgres};

// ---------------------------------------------------------------------------
// Declarative config
// ---------------------------------------------------------------------------

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `column = $n`, or `column IS NULL` for an explicit null.
    Eq,
    /// `column < $n`
    Lt,
    /// `column > $n`
    Gt,
}

impl FilterOp {
    fn as_sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Lt => "<",
            FilterOp::Gt => ">",
        }
    }
}

/// Maps a query-string filter key onto a column.
#[derive(Debug, Clone, Copy)]
pub struct FilterColumn {
    pub key: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
    pub op: FilterOp,
}

impl FilterColumn {
    pub const fn eq(key: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self { key, column, kind, op: FilterOp::Eq }
    }

    pub const fn lt(key: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self { key, column, kind, op: FilterOp::Lt }
    }

    pub const fn gt(key: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self { key, column, kind, op: FilterOp::Gt }
    }
}

/// Maps an API sort field (`sortBy=`) onto a column.
#[derive(Debug, Clone, Copy)]
pub struct SortColumn {
    pub field: &'static str,
    pub column: &'static str,
}

impl SortColumn {
    pub const fn new(field: &'static str, column: &'static str) -> Self {
        Self { field, column }
    }
}

/// Everything a [`Provider`] needs to know about one resource.
pub struct ProviderConfig<R, M> {
    /// Entity label used in not-found errors (e.g. `"Contract"`).
    pub entity: &'static str,
    /// Bare table name, used for deletes.
    pub table: &'static str,
    /// SELECT list; must produce every column `R` reads.
    pub select: &'static str,
    /// FROM clause including relation joins.
    pub from: &'static str,
    /// Qualified primary key column (e.g. `"c.id"`).
    pub id_column: &'static str,
    /// Text columns OR-ed together for `?search=`.
    pub search_columns: &'static [&'static str],
    pub filters: &'static [FilterColumn],
    pub sort_columns: &'static [SortColumn],
    /// Sort applied when the request names none. The field must appear in
    /// `sort_columns`.
    pub default_sort: (&'static str, SortDirection),
    pub transform: fn(R) -> Result<M, sqlx::Error>,
}

/// A resource's list/get/delete operations.
pub struct Provider<R, M> {
    config: ProviderConfig<R, M>,
}

impl<R, M> Provider<R, M> {
    pub const fn new(config: ProviderConfig<R, M>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProviderConfig<R, M> {
        &self.config
    }

    pub fn entity(&self) -> &'static str {
        self.config.entity
    }
}

impl<R, M> ListSchema for Provider<R, M> {
    fn filter_kind(&self, key: &str) -> Option<FilterKind> {
        self.config
            .filters
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.kind)
    }

    fn is_sortable(&self, field: &str) -> bool {
        self.config.sort_columns.iter().any(|s| s.field == field)
    }
}

// ---------------------------------------------------------------------------
// Query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built list queries.
#[derive(Debug, Clone)]
enum BindValue {
    BigInt(i64),
    Bool(bool),
    Text(String),
    Date(Date),
}

impl BindValue {
    /// `None` for a `null` filter, which becomes `IS NULL`.
    fn from_filter(value: &FilterValue) -> Option<Self> {
        match value {
            FilterValue::Null => None,
            FilterValue::Int(v) => Some(BindValue::BigInt(*v)),
            FilterValue::Bool(v) => Some(BindValue::Bool(*v)),
            FilterValue::Date(v) => Some(BindValue::Date(*v)),
            FilterValue::Text(v) => Some(BindValue::Text(v.clone())),
        }
    }
}

/// A WHERE clause with its positional bind values.
#[derive(Debug, Default)]
struct Predicate {
    where_clause: String,
    binds: Vec<BindValue>,
}

impl Predicate {
    fn next_index(&self) -> usize {
        self.binds.len() + 1
    }
}

impl<R, M> Provider<R, M> {
    /// Build the WHERE clause: filters AND-ed, search OR-ed across columns.
    ///
    /// Filter keys are validated at the boundary; an unknown key here is a
    /// programming error and is reported as `ColumnNotFound`.
    fn build_predicate(&self, params: &ListParams) -> Result<Predicate, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<BindValue> = Vec::new();

        for (key, value) in &params.filters {
            let filter = self
                .config
                .filters
                .iter()
                .find(|f| f.key == key.as_str())
                .ok_or_else(|| sqlx::Error::ColumnNotFound(key.clone()))?;

            match BindValue::from_filter(value) {
                None => conditions.push(format!("{} IS NULL", filter.column)),
                Some(bind) => {
                    binds.push(bind);
                    conditions.push(format!(
                        "{} {} ${}",
                        filter.column,
                        filter.op.as_sql(),
                        binds.len()
                    ));
                }
            }
        }

        if let Some(term) = params.search_term() {
            if !self.config.search_columns.is_empty() {
                binds.push(BindValue::Text(format!("%{}%", escape_like(term))));
                let idx = binds.len();
                let ors: Vec<String> = self
                    .config
                    .search_columns
                    .iter()
                    .map(|col| format!("{col} ILIKE ${idx}"))
                    .collect();
                conditions.push(format!("({})", ors.join(" OR ")));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        Ok(Predicate { where_clause, binds })
    }

    /// Resolve the ORDER BY clause, falling back to the resource default.
    fn order_by(&self, params: &ListParams) -> Result<String, sqlx::Error> {
        let (field, direction) = match &params.sort {
            Some(sort) => (sort.field.as_str(), sort.direction),
            None => {
                let (field, direction) = self.config.default_sort;
                (field, params.order.unwrap_or(direction))
            }
        };
        let column = self
            .config
            .sort_columns
            .iter()
            .find(|s| s.field == field)
            .map(|s| s.column)
            .ok_or_else(|| sqlx::Error::ColumnNotFound(field.to_string()))?;

        Ok(format!(
            "ORDER BY {column} {}, {} ASC",
            direction.as_sql(),
            self.config.id_column
        ))
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl<R, M> Provider<R, M>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    /// Filtered, sorted, paginated listing.
    pub async fn list(
        &self,
        pool: &PgPool,
        params: &ListParams,
    ) -> Result<PaginatedResponse<M>, sqlx::Error> {
        let predicate = self.build_predicate(params)?;
        let order_by = self.order_by(params)?;
        let limit = params.effective_limit();
        let page = params.effective_page();
        let idx = predicate.next_index();

        let query = format!(
            "SELECT {} FROM {} {} {order_by} LIMIT ${idx} OFFSET ${}",
            self.config.select,
            self.config.from,
            predicate.where_clause,
            idx + 1
        );
        let rows = bind_values(sqlx::query_as::<_, R>(&query), &predicate.binds)
            .bind(limit)
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let count_query = format!(
            "SELECT COUNT(*)::BIGINT FROM {} {}",
            self.config.from, predicate.where_clause
        );
        let total = bind_values_scalar(sqlx::query_scalar::<_, i64>(&count_query), &predicate.binds)
            .fetch_one(pool)
            .await?;

        let data = rows
            .into_iter()
            .map(self.config.transform)
            .collect::<Result<Vec<M>, _>>()?;

        Ok(PaginatedResponse {
            data,
            pagination: Pagination::new(total, page, limit),
        })
    }

    /// Find one row by id. Absence is `Ok(None)`, never an error.
    pub async fn get(&self, pool: &PgPool, id: DbId) -> Result<Option<M>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            self.config.select, self.config.from, self.config.id_column
        );
        sqlx::query_as::<_, R>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(self.config.transform)
            .transpose()
    }

    pub async fn exists(&self, pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            self.config.table
        );
        sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Count rows whose `column` equals `value`; used for referential
    /// pre-checks such as "industry has children".
    pub async fn count_where(
        &self,
        pool: &PgPool,
        column: &'static str,
        value: DbId,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*)::BIGINT FROM {} WHERE {column} = $1",
            self.config.table
        );
        sqlx::query_scalar::<_, i64>(&query)
            .bind(value)
            .fetch_one(pool)
            .await
    }

    /// Whether another row already holds `value` in a unique text column.
    pub async fn value_taken(
        &self,
        pool: &PgPool,
        column: &'static str,
        value: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {column} = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
            self.config.table
        );
        sqlx::query_scalar::<_, bool>(&query)
            .bind(value)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
    }

    /// Hard delete. Returns `true` if a row was removed.
    ///
    /// Performs no dependency checks; callers guard referential rules first.
    pub async fn delete(&self, pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.config.table);
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_values<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    binds: &[BindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for val in binds {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Bool(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.clone()),
            BindValue::Date(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_values_scalar<'q>(
    mut q: QueryScalar<'q, Postgres, i64, PgArguments>,
    binds: &[BindValue],
) -> QueryScalar<'q, Postgres, i64, PgArguments> {
    for val in binds {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Bool(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.clone()),
            BindValue::Date(v) => q = q.bind(*v),
        }
    }
    q
}
