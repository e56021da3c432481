//! List query parsing and store query composition.

pub mod filter;
pub mod sort;
pub mod builder;

pub use filter::{get_filter_options, FieldMappings, Filter, FilterOperator, QueryValue, RawQuery};
pub use sort::{get_sort_options, SortOption, SortOrder};
pub use builder::{build_query, BuiltQuery, Criterion, IdValue, Query, QueryOptions, SortDirection, SortMap};
