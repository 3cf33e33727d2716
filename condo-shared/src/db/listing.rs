/// Search, ordering and pagination for list endpoints
///
/// Every collection accepts the same query parameters:
///
/// ```text
/// ?search=garcia&ordering=-fecha_registro&limit=50&offset=100
/// ```
///
/// `ordering` is resolved against a per-resource allow-list so user input
/// never reaches the SQL text.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

/// Default page size
pub const DEFAULT_LIMIT: i64 = 100;

/// Largest page a client may request
pub const MAX_LIMIT: i64 = 500;

/// Common list query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Free-text search over the resource's text columns
    pub search: Option<String>,

    /// `field` for ascending, `-field` for descending
    pub ordering: Option<String>,

    /// Page size
    pub limit: Option<i64>,

    /// Rows to skip
    pub offset: Option<i64>,
}

impl ListParams {
    /// Page size, clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Offset, never negative
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// `ILIKE` pattern for the search term, if any
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }

    /// Resolves `ordering` to an `ORDER BY` expression
    ///
    /// `allowed` maps public field names to SQL columns. Unknown fields fall
    /// back to `default`.
    pub fn order_by(&self, allowed: &[(&str, &str)], default: &str) -> String {
        let Some(raw) = self.ordering.as_deref().map(str::trim) else {
            return default.to_string();
        };

        let (field, direction) = match raw.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (raw, "ASC"),
        };

        allowed
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| format!("{} {}", column, direction))
            .unwrap_or_else(|| default.to_string())
    }
}

/// Incrementally builds a `WHERE` clause on a [`QueryBuilder`]
pub struct Filter<'q> {
    builder: QueryBuilder<'q, Postgres>,
    has_where: bool,
}

impl<'q> Filter<'q> {
    /// Starts from a `SELECT ... FROM ...` prefix without a `WHERE`
    pub fn new(select: &str) -> Self {
        Self {
            builder: QueryBuilder::new(select),
            has_where: false,
        }
    }

    /// Opens the next condition and returns the builder to finish it
    pub fn and(&mut self) -> &mut QueryBuilder<'q, Postgres> {
        self.builder
            .push(if self.has_where { " AND " } else { " WHERE " });
        self.has_where = true;
        &mut self.builder
    }

    /// Adds `column = value` when `value` is present
    pub fn eq<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'q + Send + sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres>,
    {
        if let Some(value) = value {
            self.and().push(column).push(" = ").push_bind(value);
        }
        self
    }

    /// Adds `column >= value` when `value` is present
    pub fn gte<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'q + Send + sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres>,
    {
        if let Some(value) = value {
            self.and().push(column).push(" >= ").push_bind(value);
        }
        self
    }

    /// Adds `column <= value` when `value` is present
    pub fn lte<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'q + Send + sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres>,
    {
        if let Some(value) = value {
            self.and().push(column).push(" <= ").push_bind(value);
        }
        self
    }

    /// Adds `(col1 ILIKE $n OR col2 ILIKE $n ...)` for the search term
    pub fn search(&mut self, params: &ListParams, columns: &[&str]) -> &mut Self {
        if columns.is_empty() {
            return self;
        }

        if let Some(pattern) = params.search_pattern() {
            let builder = self.and();
            builder.push("(");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(*column).push(" ILIKE ").push_bind(pattern.clone());
            }
            builder.push(")");
        }
        self
    }

    /// Appends ordering and pagination and hands back the builder
    pub fn finish(
        mut self,
        params: &ListParams,
        allowed: &[(&str, &str)],
        default_order: &str,
    ) -> QueryBuilder<'q, Postgres> {
        self.builder
            .push(" ORDER BY ")
            .push(params.order_by(allowed, default_order))
            .push(" LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());
        self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[(&str, &str)] = &[("nombre", "nombre"), ("fecha", "fecha_registro")];

    #[test]
    fn test_limit_is_clamped() {
        let params = ListParams {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(params.limit(), MAX_LIMIT);

        let params = ListParams {
            limit: Some(0),
            offset: Some(-5),
            ..Default::default()
        };
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 0);
        assert_eq!(ListParams::default().limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_search_pattern_ignores_blank() {
        let params = ListParams {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_pattern(), None);

        let params = ListParams {
            search: Some(" Garcia ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_pattern().as_deref(), Some("%Garcia%"));
    }

    #[test]
    fn test_order_by_allow_list() {
        let params = ListParams {
            ordering: Some("-fecha".to_string()),
            ..Default::default()
        };
        assert_eq!(params.order_by(FIELDS, "id"), "fecha_registro DESC");

        let params = ListParams {
            ordering: Some("nombre".to_string()),
            ..Default::default()
        };
        assert_eq!(params.order_by(FIELDS, "id"), "nombre ASC");

        let params = ListParams {
            ordering: Some("nombre; DROP TABLE personas".to_string()),
            ..Default::default()
        };
        assert_eq!(params.order_by(FIELDS, "id"), "id");
    }

    #[test]
    fn test_filter_builds_where_clause() {
        let params = ListParams {
            search: Some("ana".to_string()),
            ordering: Some("nombre".to_string()),
            ..Default::default()
        };

        let mut filter = Filter::new("SELECT * FROM personas");
        filter
            .eq("estado", Some("activo".to_string()))
            .eq::<String>("tipo", None)
            .search(&params, &["nombre", "apellido"]);
        let builder = filter.finish(&params, FIELDS, "id");

        assert_eq!(
            builder.sql(),
            "SELECT * FROM personas WHERE estado = $1 AND (nombre ILIKE $2 OR apellido ILIKE $3) \
             ORDER BY nombre ASC LIMIT $4 OFFSET $5"
        );
    }
}
