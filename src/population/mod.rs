//! Microdata and constraint data model.
//!
//! The microdata pool is a shared, read-only input to every area's
//! anneal: record attribute rows are stored in one contiguous buffer
//! so the proposal loop walks cache-friendly slices. Constraints are
//! grouped per area; results are produced once per area and moved to
//! the output sinks.

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

/// One survey record: a stable identifier plus one non-negative value
/// per attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrodataRecord {
    /// Stable record identifier.
    pub id: String,
    /// Attribute values, in the shared attribute ordering.
    pub values: Vec<f64>,
}

/// The shared pool of microdata records.
///
/// Attribute values live in a single row-major buffer; [`row`](Self::row)
/// hands out a borrowed slice per record.
#[derive(Debug, Clone)]
pub struct MicrodataPool {
    attributes: Vec<String>,
    ids: Vec<String>,
    values: Vec<f64>,
    width: usize,
}

impl MicrodataPool {
    /// Builds a pool from an attribute header and a list of records.
    ///
    /// Every record must carry exactly one value per attribute.
    pub fn new(attributes: Vec<String>, records: Vec<MicrodataRecord>) -> SynthResult<Self> {
        let width = attributes.len();
        let mut ids = Vec::with_capacity(records.len());
        let mut values = Vec::with_capacity(records.len() * width);
        for record in records {
            if record.values.len() != width {
                return Err(SynthError::Configuration(format!(
                    "microdata record '{}' has {} values, expected {}",
                    record.id,
                    record.values.len(),
                    width
                )));
            }
            ids.push(record.id);
            values.extend_from_slice(&record.values);
        }
        Ok(Self {
            attributes,
            ids,
            values,
            width,
        })
    }

    /// Number of records in the pool.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the pool holds no records.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of attributes per record.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The attribute header shared by every record.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Identifier of the record at `index`.
    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    /// Attribute values of the record at `index`.
    #[inline]
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.width;
        &self.values[start..start + self.width]
    }
}

/// Target totals for one geographic area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaConstraint {
    /// Stable area identifier.
    pub id: String,
    /// Target totals, in the shared attribute ordering.
    pub values: Vec<f64>,
    /// Number of individuals to draw for this area.
    pub population: u32,
}

/// The constraint table: an attribute header plus one row per area.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    attributes: Vec<String>,
    areas: Vec<AreaConstraint>,
}

impl ConstraintSet {
    /// Builds a constraint set, checking row widths and population
    /// counts up front.
    pub fn new(attributes: Vec<String>, areas: Vec<AreaConstraint>) -> SynthResult<Self> {
        for area in &areas {
            if area.values.len() != attributes.len() {
                return Err(SynthError::Configuration(format!(
                    "constraint row '{}' has {} values, expected {}",
                    area.id,
                    area.values.len(),
                    attributes.len()
                )));
            }
            if area.population == 0 {
                return Err(SynthError::Configuration(format!(
                    "constraint row '{}' has a zero population count",
                    area.id
                )));
            }
        }
        Ok(Self { attributes, areas })
    }

    /// The attribute header of the constraint table.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The per-area constraint rows.
    pub fn areas(&self) -> &[AreaConstraint] {
        &self.areas
    }

    /// Number of areas.
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Whether the table holds no areas.
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

/// Whether a record may participate in an area.
///
/// A record is feasible iff its value is zero at every index where the
/// area's constraint is exactly zero. All other magnitudes are soft
/// and handled by the divergence.
#[inline]
pub fn is_feasible(record: &[f64], constraint: &[f64]) -> bool {
    constraint
        .iter()
        .zip(record)
        .all(|(&c, &r)| c != 0.0 || r == 0.0)
}

/// Rejects a run whose two input tables disagree on attribute ordering.
pub fn ensure_matching_schema(
    constraints: &ConstraintSet,
    pool: &MicrodataPool,
) -> SynthResult<()> {
    if constraints.attributes() != pool.attributes() {
        return Err(SynthError::SchemaMismatch {
            constraints: constraints.attributes().to_vec(),
            microdata: pool.attributes().to_vec(),
        });
    }
    Ok(())
}

/// The synthesised population for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaResult {
    /// Area identifier.
    pub area: String,
    /// Number of individuals drawn.
    pub population: u32,
    /// Achieved per-attribute totals of the selected records.
    pub totals: Vec<f64>,
    /// The target totals the anneal was driven by.
    pub target: Vec<f64>,
    /// Identifier of every selected record; the same identifier may
    /// appear multiple times (selection is with replacement).
    pub record_ids: Vec<String>,
    /// Divergence between target and achieved totals.
    pub fitness: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, values: &[f64]) -> MicrodataRecord {
        MicrodataRecord {
            id: id.into(),
            values: values.to_vec(),
        }
    }

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pool_stores_rows_contiguously() {
        let pool = MicrodataPool::new(
            header(&["a", "b"]),
            vec![record("r1", &[1.0, 2.0]), record("r2", &[3.0, 4.0])],
        )
        .unwrap();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.width(), 2);
        assert_eq!(pool.row(0), &[1.0, 2.0]);
        assert_eq!(pool.row(1), &[3.0, 4.0]);
        assert_eq!(pool.id(1), "r2");
    }

    #[test]
    fn pool_rejects_ragged_rows() {
        let err = MicrodataPool::new(
            header(&["a", "b"]),
            vec![record("r1", &[1.0])],
        )
        .unwrap_err();
        assert!(matches!(err, SynthError::Configuration(_)));
    }

    #[test]
    fn constraint_set_rejects_zero_population() {
        let err = ConstraintSet::new(
            header(&["a"]),
            vec![AreaConstraint {
                id: "A1".into(),
                values: vec![5.0],
                population: 0,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, SynthError::Configuration(_)));
    }

    #[test]
    fn feasibility_requires_zeros_where_constrained() {
        let constraint = [5.0, 0.0, 5.0];
        assert!(is_feasible(&[1.0, 0.0, 1.0], &constraint));
        assert!(!is_feasible(&[1.0, 1.0, 0.0], &constraint));
        // Non-zero constraints accept any record value, including zero.
        assert!(is_feasible(&[0.0, 0.0, 0.0], &constraint));
    }

    #[test]
    fn schema_check_compares_headers() {
        let pool = MicrodataPool::new(header(&["a", "b"]), vec![]).unwrap();

        let matching = ConstraintSet::new(header(&["a", "b"]), vec![]).unwrap();
        assert!(ensure_matching_schema(&matching, &pool).is_ok());

        let reordered = ConstraintSet::new(header(&["b", "a"]), vec![]).unwrap();
        let err = ensure_matching_schema(&reordered, &pool).unwrap_err();
        assert!(matches!(err, SynthError::SchemaMismatch { .. }));
    }
}
