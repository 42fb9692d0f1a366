//! Row types shared by the store, the pipeline and the writers.

use serde::{Deserialize, Serialize, Serializer};

/// Sales year as stored in `ANO_VENDA`.
pub type Year = i32;

/// One entry of the municipality directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalityRef {
    pub id:   i64,
    pub name: String,
}

impl MunicipalityRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// One grouped-sum result: total units of an ingredient sold in a
/// municipality during a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesAggregateRow {
    #[serde(rename = "ANO_VENDA")]
    pub year: Year,
    #[serde(rename = "MUNICIPIO_VENDA")]
    pub municipality: String,
    #[serde(rename = "PRINCIPIO_ATIVO")]
    pub active_ingredient: String,
    #[serde(rename = "TOTAL_VENDIDO", serialize_with = "serialize_quantity")]
    pub total_quantity: f64,
}

impl SalesAggregateRow {
    pub fn new(
        year: Year,
        municipality: impl Into<String>,
        active_ingredient: impl Into<String>,
        total_quantity: f64,
    ) -> Self {
        Self {
            year,
            municipality: municipality.into(),
            active_ingredient: active_ingredient.into(),
            total_quantity,
        }
    }
}

/// Numeric encoder for `TOTAL_VENDIDO`.
///
/// Always emits a JSON float (`100.0`, never `100`) and refuses NaN and
/// infinities instead of letting them degrade to `null`.
pub fn serialize_quantity<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "non-finite quantity {value} cannot be encoded"
        )));
    }
    serializer.serialize_f64(*value)
}

/// Ordered, append-only result set built across the municipality loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedTable {
    rows: Vec<SalesAggregateRow>,
}

impl AccumulatedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one municipality's batch, keeping its order.
    pub fn append(&mut self, batch: Vec<SalesAggregateRow>) {
        self.rows.extend(batch);
    }

    pub fn rows(&self) -> &[SalesAggregateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<SalesAggregateRow>> for AccumulatedTable {
    fn from(rows: Vec<SalesAggregateRow>) -> Self {
        Self { rows }
    }
}
