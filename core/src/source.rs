//! The query-source seam.
//!
//! RULE: The pipeline never talks SQL. It asks a SalesSource for the
//! municipality directory and for one municipality's grouped totals.
//! Implementations own the storage details, convert storage values into
//! typed rows, and classify timeouts so the aggregator can retry them.

use crate::{
    error::{LookupError, QueryError},
    types::{MunicipalityRef, SalesAggregateRow},
};

pub trait SalesSource {
    /// Every known municipality, sorted by name.
    fn list_municipalities(&self) -> Result<Vec<MunicipalityRef>, LookupError>;

    /// Grouped-sum totals for one municipality, one row per
    /// (year, municipality, ingredient), largest total first.
    fn grouped_totals(&self, municipality: &str) -> Result<Vec<SalesAggregateRow>, QueryError>;
}

impl<S: SalesSource + ?Sized> SalesSource for &S {
    fn list_municipalities(&self) -> Result<Vec<MunicipalityRef>, LookupError> {
        (**self).list_municipalities()
    }

    fn grouped_totals(&self, municipality: &str) -> Result<Vec<SalesAggregateRow>, QueryError> {
        (**self).grouped_totals(municipality)
    }
}
