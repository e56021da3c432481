//! Sort directives from `_sort` / `_order` query parameters.

use crate::query::filter::RawQuery;
use serde::{Deserialize, Serialize};

pub const SORT_PARAM: &str = "_sort";
pub const ORDER_PARAM: &str = "_order";
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `asc` (any case) is ascending; every other value sorts descending.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub field: String,
    pub order: SortOrder,
}

impl SortOption {
    pub fn new(field: &str, order: SortOrder) -> Self {
        SortOption {
            field: field.to_string(),
            order,
        }
    }

    /// Newest first.
    pub fn default_directive() -> Self {
        SortOption::new(DEFAULT_SORT_FIELD, SortOrder::Desc)
    }
}

pub fn get_sort_options(query: &RawQuery) -> Vec<SortOption> {
    let fields = query.get(SORT_PARAM).filter(|v| v.is_present());
    let orders = query.get(ORDER_PARAM).filter(|v| v.is_present());
    let (Some(fields), Some(orders)) = (fields, orders) else {
        return vec![SortOption::default_directive()];
    };

    let orders = orders.to_list();
    let options: Vec<SortOption> = fields
        .to_list()
        .iter()
        .enumerate()
        .map(|(i, field)| SortOption {
            field: field.clone(),
            order: orders
                .get(i)
                .filter(|o| !o.is_empty())
                .map(|o| SortOrder::parse(o))
                .unwrap_or(SortOrder::Asc),
        })
        .collect();

    if options.is_empty() {
        vec![SortOption::default_directive()]
    } else {
        options
    }
}
