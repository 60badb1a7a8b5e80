// ABOUTME: Data layer for Metatag
// ABOUTME: Pool bootstrap, migrations, the generic repository and advanced search

pub mod db;
pub mod error;
pub mod record;
pub mod repository;
pub mod retry;
pub mod search;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use db::{init, list_tables, run_migrations, DatabaseConfig, MIGRATOR};
pub use error::{StorageError, StorageResult};
pub use record::{Columns, FieldSpec, FieldType, Record, RecordSpec, Value};
pub use repository::Repository;
pub use retry::RetryConfig;
pub use search::{
    AdvancedSearchRequest, AdvancedSearchResponse, Filter, FilterType, LogicOperator, Sort,
    SortType, MAX_SEARCH_RESULTS,
};
