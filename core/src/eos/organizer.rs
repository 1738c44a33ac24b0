//! Grouping equation of state fits by element, method and structure, and turning the groups
//! into table rows and plot inputs.
//!
//! Energies in tables and plots can be reported as ΔE, relative to the lowest e0 of the
//! peer set: across methods for one structure in tables, across structures for one method
//! in plots.
use crate::error::{Error, Result};

use super::EosFit;

/// A fit for one structure of one element, computed with one method.
#[derive(Clone, Debug)]
pub struct SingleCrystalEos {
    pub structure: String,
    pub element: String,
    pub method: String,
    pub fit: EosFit,
}

impl SingleCrystalEos {
    pub fn new(
        element: impl Into<String>,
        method: impl Into<String>,
        structure: impl Into<String>,
        fit: EosFit,
    ) -> Self {
        Self {
            structure: structure.into(),
            element: element.into(),
            method: method.into(),
            fit,
        }
    }

    fn row(&self, decimals: usize, e0: f64) -> [String; 4] {
        [
            self.method.clone(),
            format!("{:.*}", decimals, self.fit.v0),
            format!("{:.*}", decimals, self.fit.b0),
            format!("{:.*}", decimals, e0),
        ]
    }

    fn series(&self, shift: f64) -> PlotSeries {
        let shifted = |points: &[(f64, f64)]| {
            points
                .iter()
                .map(|&(volume, energy)| (volume, energy - shift))
                .collect()
        };

        PlotSeries {
            label: self.structure.clone(),
            data: shifted(&self.fit.data),
            fit_data: shifted(&self.fit.fit_data),
        }
    }
}

/// Several structures of one element, all computed with the same method.
#[derive(Clone, Debug)]
pub struct MultiCrystalEos {
    label: String,
    element: String,
    method: String,
    crystals: Vec<SingleCrystalEos>,
}

impl MultiCrystalEos {
    /// Fails if the structures are not distinct or the crystals mix methods or elements.
    pub fn new(label: impl Into<String>, crystals: Vec<SingleCrystalEos>) -> Result<Self> {
        let Some(first) = crystals.first() else {
            return Err(Error::NoRecords);
        };
        let (element, method) = (first.element.clone(), first.method.clone());

        for (index, crystal) in crystals.iter().enumerate() {
            if crystal.method != method {
                return Err(Error::MixedMethods(method, crystal.method.clone()));
            }
            if crystal.element != element {
                return Err(Error::MixedElements(element, crystal.element.clone()));
            }
            if crystals[..index]
                .iter()
                .any(|other| other.structure == crystal.structure)
            {
                return Err(Error::DuplicateStructure(crystal.structure.clone()));
            }
        }

        Ok(Self {
            label: label.into(),
            element,
            method,
            crystals,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn crystals(&self) -> &[SingleCrystalEos] {
        &self.crystals
    }

    pub fn get(&self, structure: &str) -> Option<&SingleCrystalEos> {
        self.crystals
            .iter()
            .find(|crystal| crystal.structure == structure)
    }

    /// One `[method, v0, b0, e0]` row per structure.
    pub fn table_rows(&self, decimals: usize) -> Vec<StructureTable> {
        self.crystals
            .iter()
            .map(|crystal| StructureTable {
                structure: crystal.structure.clone(),
                rows: vec![crystal.row(decimals, crystal.fit.e0)],
            })
            .collect()
    }

    /// The lowest e0 of any structure
    pub fn min_e0(&self) -> f64 {
        self.crystals
            .iter()
            .map(|crystal| crystal.fit.e0)
            .fold(f64::INFINITY, f64::min)
    }

    /// One series per structure. With `delta`, energies are relative to [`Self::min_e0`].
    pub fn plot_data(&self, delta: bool) -> Vec<PlotSeries> {
        let shift = if delta { self.min_e0() } else { 0.0 };
        self.crystals
            .iter()
            .map(|crystal| crystal.series(shift))
            .collect()
    }
}

/// Every method's results for one element.
#[derive(Clone, Debug)]
pub struct ElementEos {
    element: String,
    groups: Vec<MultiCrystalEos>,
}

impl ElementEos {
    pub fn new(element: impl Into<String>, groups: Vec<MultiCrystalEos>) -> Result<Self> {
        let element = element.into();
        if let Some(group) = groups.iter().find(|group| group.element != element) {
            return Err(Error::MixedElements(element, group.element.clone()));
        }
        Ok(Self { element, groups })
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn groups(&self) -> &[MultiCrystalEos] {
        &self.groups
    }

    pub fn methods(&self) -> Vec<&str> {
        self.groups.iter().map(MultiCrystalEos::method).collect()
    }

    /// Every structure any method computed, in order of first appearance.
    pub fn structures(&self) -> Vec<&str> {
        let mut structures = Vec::new();
        for crystal in self.groups.iter().flat_map(|group| &group.crystals) {
            if !structures.contains(&crystal.structure.as_str()) {
                structures.push(crystal.structure.as_str());
            }
        }
        structures
    }

    /// Per structure, one `[method, v0, b0, e0]` row for each method that computed it. With
    /// `delta`, e0 is taken relative to the lowest e0 of any method for that structure.
    pub fn table_rows(&self, decimals: usize, delta: bool) -> Vec<StructureTable> {
        self.structures()
            .into_iter()
            .map(|structure| {
                let crystals = self
                    .groups
                    .iter()
                    .filter_map(|group| group.get(structure))
                    .collect::<Vec<_>>();

                let reference = if delta {
                    crystals
                        .iter()
                        .map(|crystal| crystal.fit.e0)
                        .fold(f64::INFINITY, f64::min)
                } else {
                    0.0
                };

                StructureTable {
                    structure: structure.to_owned(),
                    rows: crystals
                        .iter()
                        .map(|crystal| crystal.row(decimals, crystal.fit.e0 - reference))
                        .collect(),
                }
            })
            .collect()
    }

    /// One plot per method, each with one series per structure.
    pub fn plot_data(&self, delta: bool) -> Vec<MethodPlot> {
        self.groups
            .iter()
            .map(|group| MethodPlot {
                method: group.method.clone(),
                series: group.plot_data(delta),
            })
            .collect()
    }

    /// Plot inputs (as ΔE) for every method. With a reference method, every other method's
    /// plot starts with the reference curves so the two can be drawn against each other.
    pub fn make_plots(&self, reference: Option<&str>) -> Result<Vec<PlotSet>> {
        let plots = self.plot_data(true);

        let Some(reference) = reference else {
            return Ok(plots
                .into_iter()
                .map(|plot| PlotSet {
                    method: plot.method,
                    reference: None,
                    series: plot.series,
                })
                .collect());
        };

        let reference_plot = plots
            .iter()
            .find(|plot| plot.method == reference)
            .ok_or_else(|| Error::UnknownMethod(reference.to_owned()))?;

        Ok(plots
            .iter()
            .filter(|plot| plot.method != reference)
            .map(|plot| PlotSet {
                method: plot.method.clone(),
                reference: Some(reference.to_owned()),
                series: reference_plot
                    .series
                    .iter()
                    .chain(&plot.series)
                    .cloned()
                    .collect(),
            })
            .collect())
    }
}

/// Any level of the organizer.
#[derive(Clone, Debug)]
pub enum EosRecord {
    Single(SingleCrystalEos),
    Multi(MultiCrystalEos),
    Element(ElementEos),
}

impl EosRecord {
    pub fn label(&self) -> &str {
        match self {
            Self::Single(single) => &single.structure,
            Self::Multi(multi) => &multi.label,
            Self::Element(element) => &element.element,
        }
    }

    pub fn table_rows(&self, decimals: usize) -> Vec<StructureTable> {
        match self {
            Self::Single(single) => vec![StructureTable {
                structure: single.structure.clone(),
                rows: vec![single.row(decimals, single.fit.e0)],
            }],
            Self::Multi(multi) => multi.table_rows(decimals),
            Self::Element(element) => element.table_rows(decimals, false),
        }
    }
}

/// The table rows for one structure
#[derive(Clone, Debug, PartialEq)]
pub struct StructureTable {
    pub structure: String,
    /// `[method, v0, b0, e0]`
    pub rows: Vec<[String; 4]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlotSeries {
    pub label: String,
    /// (V, E) of the fitted points
    pub data: Vec<(f64, f64)>,
    /// (V, E) of the fitted curve
    pub fit_data: Vec<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodPlot {
    pub method: String,
    pub series: Vec<PlotSeries>,
}

/// Everything needed to draw one figure.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotSet {
    pub method: String,
    /// The method whose curves come first in `series`, if any
    pub reference: Option<String>,
    pub series: Vec<PlotSeries>,
}

/// Group fits by element, then by method. Groups keep the order in which their first fit
/// appears.
pub fn organize_eos_results(
    records: impl IntoIterator<Item = SingleCrystalEos>,
) -> Result<Vec<ElementEos>> {
    let mut by_element: Vec<(String, Vec<(String, Vec<SingleCrystalEos>)>)> = Vec::new();

    for record in records {
        let element_index = match by_element
            .iter()
            .position(|(element, _)| *element == record.element)
        {
            Some(index) => index,
            None => {
                by_element.push((record.element.clone(), Vec::new()));
                by_element.len() - 1
            }
        };

        let methods = &mut by_element[element_index].1;
        match methods
            .iter_mut()
            .find(|(method, _)| *method == record.method)
        {
            Some((_, crystals)) => crystals.push(record),
            None => methods.push((record.method.clone(), vec![record])),
        }
    }

    by_element
        .into_iter()
        .map(|(element, methods)| {
            let groups = methods
                .into_iter()
                .map(|(method, crystals)| {
                    MultiCrystalEos::new(format!("{element} {method}"), crystals)
                })
                .collect::<Result<Vec<_>>>()?;
            log::debug!("{element}: {} methods", groups.len());
            ElementEos::new(element, groups)
        })
        .collect()
}
