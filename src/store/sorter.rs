//! Result sorting for queries
//!
//! Sort is stable. Ordering rules, ascending:
//! - missing or null < bool < number < date/datetime < text < structured
//! - same rank: natural ordering; structured values compare equal
//!
//! Descending reverses the comparison, so missing values come last.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::query::SortOrder;
use super::record::ModelRecord;
use crate::schema::FieldValue;

/// Sorts records by one field
pub struct RecordSorter;

impl RecordSorter {
    pub fn sort(records: &mut [ModelRecord], field: &str, order: SortOrder) {
        records.sort_by(|a, b| {
            let ordering = Self::compare_values(a.get(field), b.get(field));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    /// Three-way comparison of two optional values
    pub fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
        let a = a.filter(|v| !v.is_null());
        let b = b.filter(|v| !v.is_null());

        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => {
                let rank = Self::rank(a_val).cmp(&Self::rank(b_val));
                if rank != Ordering::Equal {
                    return rank;
                }

                if let (Some(x), Some(y)) = (a_val.as_bool(), b_val.as_bool()) {
                    return x.cmp(&y);
                }
                if let (Some(x), Some(y)) = (a_val.as_f64(), b_val.as_f64()) {
                    return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                }
                if let (Some(x), Some(y)) = (Self::instant(a_val), Self::instant(b_val)) {
                    return x.cmp(&y);
                }
                if let (Some(x), Some(y)) = (a_val.as_str(), b_val.as_str()) {
                    return x.cmp(y);
                }
                Ordering::Equal
            }
        }
    }

    fn rank(value: &FieldValue) -> u8 {
        if value.as_bool().is_some() {
            1
        } else if value.as_f64().is_some() {
            2
        } else if Self::instant(value).is_some() {
            3
        } else if value.as_str().is_some() {
            4
        } else {
            5
        }
    }

    /// Dates sort as midnight UTC so they interleave with datetimes
    fn instant(value: &FieldValue) -> Option<DateTime<Utc>> {
        match value {
            FieldValue::DateTime(ts) => Some(ts.instant()),
            FieldValue::Date(d) => d.and_hms_opt(0, 0, 0).map(|n| n.and_utc()),
            _ => None,
        }
    }
}
