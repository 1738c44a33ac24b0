//! Convergence of a quantity with respect to a numerical parameter (a cutoff, a k-point
//! density, ...) across stored calculation records.
//!
//! Records are JSON documents. Where they come from is up to the [`RecordStore`].
use serde::de::DeserializeOwned;
use serde_json::Value;
use smallvec::SmallVec;

use crate::{
    cell::Cell,
    error::{Error, Result},
    parse::{Energies, EnergySelector},
};

/// Anything that can hand out the records matching a filter.
pub trait RecordStore {
    fn find(&self, filter: &dyn Fn(&Value) -> bool) -> Result<Vec<Value>>;
}

impl RecordStore for [Value] {
    fn find(&self, filter: &dyn Fn(&Value) -> bool) -> Result<Vec<Value>> {
        Ok(self.iter().filter(|record| filter(record)).cloned().collect())
    }
}

impl RecordStore for Vec<Value> {
    fn find(&self, filter: &dyn Fn(&Value) -> bool) -> Result<Vec<Value>> {
        self.as_slice().find(filter)
    }
}

/// A step applied to the (x, y) curve after it has been read from the records.
#[derive(Copy, Clone, Debug)]
pub enum PostProcessor {
    /// Sort ascending by x
    SortByX,
    /// Subtract the y at the largest x from every y
    ZeroAtLargestX,
    Custom(fn(&mut Vec<(f64, f64)>)),
}

impl PostProcessor {
    pub fn apply(&self, curve: &mut Vec<(f64, f64)>) {
        match self {
            Self::SortByX => curve.sort_by(|(a, _), (b, _)| a.total_cmp(b)),
            Self::ZeroAtLargestX => {
                let reference = curve
                    .iter()
                    .max_by(|(a, _), (b, _)| a.total_cmp(b))
                    .map(|&(_, y)| y);

                if let Some(reference) = reference {
                    curve.iter_mut().for_each(|(_, y)| *y -= reference);
                }
            }
            Self::Custom(process) => process(curve),
        }
    }
}

/// What to read from the records and how to shape the result.
pub struct ConvergenceQuery<'a> {
    /// Attribute holding x, dotted for nested objects (`"params.cutoff"`)
    pub vary_attribute: String,
    pub filter: Box<dyn Fn(&Value) -> bool + 'a>,
    pub y_selector: Box<dyn Fn(&Value) -> Result<f64> + 'a>,
    /// Applied in order
    pub post_processors: SmallVec<[PostProcessor; 2]>,
}

impl<'a> ConvergenceQuery<'a> {
    pub fn new(
        vary_attribute: impl Into<String>,
        filter: impl Fn(&Value) -> bool + 'a,
        y_selector: impl Fn(&Value) -> Result<f64> + 'a,
    ) -> Self {
        Self {
            vary_attribute: vary_attribute.into(),
            filter: Box::new(filter),
            y_selector: Box::new(y_selector),
            post_processors: SmallVec::new(),
        }
    }

    pub fn then(mut self, post_processor: PostProcessor) -> Self {
        self.post_processors.push(post_processor);
        self
    }
}

/// Read an (x, y) pair from every record matching the query's filter and run the post
/// processors over the result.
pub fn grid_convergence_curve<S>(store: &S, query: &ConvergenceQuery) -> Result<Vec<(f64, f64)>>
where
    S: RecordStore + ?Sized,
{
    let records = store.find(&*query.filter)?;
    if records.is_empty() {
        return Err(Error::NoRecords);
    }

    let mut curve = records
        .iter()
        .map(|record| {
            Ok((
                numeric_attribute(record, &query.vary_attribute)?,
                (query.y_selector)(record)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    for post_processor in &query.post_processors {
        post_processor.apply(&mut curve);
    }

    log::debug!(
        "{} points for the convergence in `{}`",
        curve.len(),
        query.vary_attribute
    );
    Ok(curve)
}

/// The number stored under a dotted attribute path.
pub fn numeric_attribute(record: &Value, path: &str) -> Result<f64> {
    path.split('.')
        .try_fold(record, |value, key| value.get(key))
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::InvalidRecord(path.to_owned()))
}

fn embedded<T: DeserializeOwned>(record: &Value, key: &str) -> Result<T> {
    let value = record
        .get(key)
        .ok_or_else(|| Error::InvalidRecord(key.to_owned()))?;
    Ok(serde_json::from_value(value.clone())?)
}

/// A y selector giving the selected energy per atom of records that embed their
/// `energies` and final geometry (`out_geom`).
pub fn per_atom_energy(selector: EnergySelector) -> impl Fn(&Value) -> Result<f64> {
    move |record| {
        let energies = embedded::<Energies>(record, "energies")?;
        let cell = embedded::<Cell>(record, "out_geom")?;

        let atoms = cell.n_sites();
        if atoms == 0 {
            return Err(Error::NonPositive {
                quantity: "atom count",
                value: 0.0,
            });
        }

        Ok(energies.select(&selector, "stored record")? / atoms as f64)
    }
}

/// The usual convergence query: per atom energies against `vary_attribute`, sorted by it,
/// and with `relative` taken relative to the best converged value.
pub fn energy_convergence_query<'a>(
    vary_attribute: impl Into<String>,
    filter: impl Fn(&Value) -> bool + 'a,
    selector: EnergySelector,
    relative: bool,
) -> ConvergenceQuery<'a> {
    let query = ConvergenceQuery::new(vary_attribute, filter, per_atom_energy(selector))
        .then(PostProcessor::SortByX);

    if relative {
        query.then(PostProcessor::ZeroAtLargestX)
    } else {
        query
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::{json, Value};

    use super::{
        energy_convergence_query, grid_convergence_curve, numeric_attribute, ConvergenceQuery,
        PostProcessor,
    };
    use crate::{error::Error, parse::EnergySelector};

    fn record(cutoff: f64, total: f64, kpts: u32) -> Value {
        json!({
            "params": { "cutoff": cutoff, "kpts": kpts },
            "energies": { "electronicTotalE": total },
            "out_geom": {
                "lattice_vectors": [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]],
                "sites": [
                    { "element": "Mg", "fractional": [0.0, 0.0, 0.0] },
                    { "element": "Mg", "fractional": [0.5, 0.5, 0.5] }
                ]
            }
        })
    }

    fn store() -> Vec<Value> {
        vec![
            record(400.0, -10.2, 4),
            record(200.0, -9.0, 4),
            record(600.0, -10.4, 4),
            record(300.0, -7.0, 8),
        ]
    }

    #[test]
    fn relative_per_atom_energies() {
        let query = energy_convergence_query(
            "params.cutoff",
            |record| record["params"]["kpts"] == 4,
            EnergySelector::Any,
            true,
        );

        let curve = grid_convergence_curve(&store(), &query).unwrap();
        let expected = [(200.0, 0.7), (400.0, 0.1), (600.0, 0.0)];

        assert_eq!(curve.len(), expected.len());
        for ((x, y), (ex, ey)) in curve.iter().zip(expected) {
            assert_eq!(*x, ex);
            assert_relative_eq!(*y, ey, epsilon = 1e-12);
        }
    }

    #[test]
    fn post_processors_run_in_order() {
        let query = ConvergenceQuery::new(
            "params.cutoff",
            |_| true,
            |record| numeric_attribute(record, "params.kpts"),
        )
        .then(PostProcessor::ZeroAtLargestX)
        .then(PostProcessor::Custom(|curve| curve.reverse()));

        let curve = grid_convergence_curve(store().as_slice(), &query).unwrap();
        assert_eq!(
            curve,
            [(300.0, 4.0), (600.0, 0.0), (200.0, 0.0), (400.0, 0.0)]
        );
    }

    #[test]
    fn nothing_matched() {
        let query = energy_convergence_query("params.cutoff", |_| false, EnergySelector::Any, false);
        assert!(matches!(
            grid_convergence_curve(&store(), &query),
            Err(Error::NoRecords)
        ));
    }

    #[test]
    fn missing_attribute() {
        let query = energy_convergence_query("params.smearing", |_| true, EnergySelector::Any, false);
        assert!(matches!(
            grid_convergence_curve(&store(), &query),
            Err(Error::InvalidRecord(attribute)) if attribute == "params.smearing"
        ));
    }

    #[test]
    fn missing_energy_field() {
        let query = energy_convergence_query(
            "params.cutoff",
            |_| true,
            EnergySelector::from("electronicCohesiveE"),
            false,
        );
        assert!(matches!(
            grid_convergence_curve(&store(), &query),
            Err(Error::MissingEnergy { .. })
        ));
    }

    #[test]
    fn null_extra_energies_do_not_spoil_the_record() {
        let mut record = record(300.0, -8.0, 4);
        record["energies"]["dispersionE"] = Value::Null;

        let query = energy_convergence_query("params.cutoff", |_| true, EnergySelector::Any, false);
        assert_eq!(grid_convergence_curve(&vec![record], &query).unwrap(), [(300.0, -4.0)]);
    }
}
