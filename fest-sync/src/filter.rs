//! Typed record filters
//!
//! A filter is a conjunction of column predicates over one local model. The
//! SQLite store renders it to a `WHERE` clause; the in-memory store evaluates
//! it row by row. Both must agree, including on NULL handling: `Eq(col, Null)`
//! means "column is NULL".

use crate::model::{LocalModel, Row, Value};
use std::marker::PhantomData;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq {
        column: &'static str,
        value: Value,
    },
    /// Column value not in the list; an empty list matches every row
    NotIn {
        column: &'static str,
        values: Vec<Value>,
    },
}

impl Predicate {
    pub fn column(&self) -> &'static str {
        match self {
            Predicate::Eq { column, .. } | Predicate::NotIn { column, .. } => column,
        }
    }
}

/// Filter selecting records of `L`
#[derive(Debug, Clone)]
pub struct Filter<L> {
    predicates: Vec<Predicate>,
    _model: PhantomData<fn() -> L>,
}

impl<L: LocalModel> Filter<L> {
    /// Matches every record
    pub fn all() -> Self {
        Self {
            predicates: Vec::new(),
            _model: PhantomData,
        }
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        debug_assert!(
            L::column_index(column).is_some(),
            "{} has no column {}",
            L::KIND,
            column
        );
        self.predicates.push(Predicate::Eq {
            column,
            value: value.into(),
        });
        self
    }

    pub fn not_in<V, I>(mut self, column: &'static str, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        debug_assert!(
            L::column_index(column).is_some(),
            "{} has no column {}",
            L::KIND,
            column
        );
        self.predicates.push(Predicate::NotIn {
            column,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches_row(&self, row: &Row) -> bool {
        self.predicates.iter().all(|predicate| {
            let Some(current) = L::column_index(predicate.column()).and_then(|i| row.get(i)) else {
                return false;
            };
            match predicate {
                Predicate::Eq { value, .. } => current == value,
                Predicate::NotIn { values, .. } => !values.contains(current),
            }
        })
    }

    pub fn matches(&self, record: &L) -> bool {
        self.matches_row(&record.to_row())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocalVenue;
    use uuid::Uuid;

    fn venue(code: &str, city: Option<&str>) -> LocalVenue {
        LocalVenue {
            guid: Uuid::new_v4(),
            code: code.to_string(),
            name: "Hall".to_string(),
            address: None,
            city: city.map(str::to_string),
            latitude: None,
            longitude: None,
            website: None,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::<LocalVenue>::all().matches(&venue("V1", None)));
    }

    #[test]
    fn test_eq_is_conjunctive() {
        let filter = Filter::<LocalVenue>::all()
            .eq(LocalVenue::CODE, "V1")
            .eq("city", "Leith");

        assert!(filter.matches(&venue("V1", Some("Leith"))));
        assert!(!filter.matches(&venue("V1", Some("Perth"))));
        assert!(!filter.matches(&venue("V2", Some("Leith"))));
    }

    #[test]
    fn test_eq_null_matches_missing_value() {
        let filter = Filter::<LocalVenue>::all().eq("city", None::<String>);
        assert!(filter.matches(&venue("V1", None)));
        assert!(!filter.matches(&venue("V1", Some("Leith"))));
    }

    #[test]
    fn test_not_in() {
        let filter = Filter::<LocalVenue>::all().not_in(LocalVenue::CODE, ["V1", "V2"]);
        assert!(!filter.matches(&venue("V1", None)));
        assert!(filter.matches(&venue("V3", None)));

        let empty = Filter::<LocalVenue>::all().not_in(LocalVenue::CODE, Vec::<String>::new());
        assert!(empty.matches(&venue("V1", None)));
    }
}
