// ABOUTME: Advanced search request/response types and the SQL they compile to
// ABOUTME: Filters, sorts and pagination are validated against a RecordSpec before use

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use crate::error::{StorageError, StorageResult};
use crate::record::{FieldType, RecordSpec};

/// Default and maximum page size for advanced search
pub const MAX_SEARCH_RESULTS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Contains,
    Equals,
    StartsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOperator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    #[default]
    Asc,
    Desc,
}

/// Match one field against any of several values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(default)]
    pub field_type: FieldType,
    pub filter_type: FilterType,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Filter {
    pub fn new<I, S>(field: &str, filter_type: FilterType, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.to_string(),
            field_type: FieldType::String,
            filter_type,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn equals<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(field, FilterType::Equals, values)
    }

    pub fn starts_with<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(field, FilterType::StartsWith, values)
    }

    pub fn contains<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(field, FilterType::Contains, values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default, alias = "direction")]
    pub sort_type: SortType,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            sort_type: SortType::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            sort_type: SortType::Desc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSearchRequest {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub filters_operator: LogicOperator,
    #[serde(default)]
    pub sorts: Vec<Sort>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl AdvancedSearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn operator(mut self, operator: LogicOperator) -> Self {
        self.filters_operator = operator;
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Effective `(limit, offset)` after defaults and the result cap
    pub fn page(&self) -> StorageResult<(i64, i64)> {
        let limit = self.limit.unwrap_or(MAX_SEARCH_RESULTS);
        if limit < 0 {
            return Err(StorageError::InvalidArgument(format!(
                "limit must not be negative: {}",
                limit
            )));
        }

        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(StorageError::InvalidArgument(format!(
                "offset must not be negative: {}",
                offset
            )));
        }

        Ok((limit.min(MAX_SEARCH_RESULTS), offset))
    }

    /// Reject filters and sorts that name fields the table does not have
    pub fn validate(&self, spec: &RecordSpec) -> StorageResult<()> {
        for filter in &self.filters {
            spec.require_field(&filter.field)?;
        }
        for sort in &self.sorts {
            spec.require_field(&sort.field)?;
        }
        self.page().map(|_| ())
    }

    /// Append the WHERE clause; a request without effective filters matches every row
    pub(crate) fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        let active: Vec<&Filter> = self
            .filters
            .iter()
            .filter(|filter| !filter.values.is_empty())
            .collect();

        if active.is_empty() {
            return;
        }

        let joiner = match self.filters_operator {
            LogicOperator::And => " AND ",
            LogicOperator::Or => " OR ",
        };

        builder.push(" WHERE ");
        for (i, filter) in active.into_iter().enumerate() {
            if i > 0 {
                builder.push(joiner);
            }
            builder.push("(");
            for (j, value) in filter.values.iter().enumerate() {
                if j > 0 {
                    builder.push(" OR ");
                }
                push_comparison(builder, filter, value);
            }
            builder.push(")");
        }
    }

    pub(crate) fn push_order_by(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        for (i, sort) in self.sorts.iter().enumerate() {
            builder.push(if i == 0 { " ORDER BY " } else { ", " });
            builder.push(&sort.field);
            builder.push(match sort.sort_type {
                SortType::Asc => " ASC",
                SortType::Desc => " DESC",
            });
        }
    }
}

fn push_comparison(builder: &mut QueryBuilder<'_, Sqlite>, filter: &Filter, value: &str) {
    builder
        .push(format!("CAST({} AS TEXT) REGEXP ", filter.field))
        .push_bind(match_pattern(filter.filter_type, value));
}

/// Case-insensitive regular expression matching `value` literally
///
/// Evaluated by the `REGEXP` function registered on every connection, which
/// folds case across all of Unicode rather than only ASCII.
pub fn match_pattern(filter_type: FilterType, value: &str) -> String {
    let literal = regex::escape(value);
    match filter_type {
        FilterType::Equals => format!("(?i)^{}$", literal),
        FilterType::StartsWith => format!("(?i)^{}", literal),
        FilterType::Contains => format!("(?i){}", literal),
    }
}

/// One page of matches plus the total match count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSearchResponse<T> {
    pub results: Vec<T>,
    /// Number of results in this page
    pub count: i64,
    pub offset: i64,
    /// Matches across all pages
    pub count_total: i64,
}

impl<T> AdvancedSearchResponse<T> {
    /// Swap in projected results, keeping the paging figures
    pub fn with_results<U>(self, results: Vec<U>) -> AdvancedSearchResponse<U> {
        AdvancedSearchResponse {
            count: results.len() as i64,
            results,
            offset: self.offset,
            count_total: self.count_total,
        }
    }
}
