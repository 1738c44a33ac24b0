use std::sync::Arc;

use elstruct_core::{
    eos::{
        organizer::{
            organize_eos_results, EosRecord, MultiCrystalEos, SingleCrystalEos, StructureTable,
        },
        EosFit, EosModel, EosParameters, ModelCurve,
    },
    Error,
};

fn fit(e0: f64, v0: f64, b0: f64) -> EosFit {
    let data = (0..5)
        .map(|i| {
            let volume = v0 - 2.0 + i as f64;
            (volume, e0 + 0.01 * (volume - v0).powi(2))
        })
        .collect::<Vec<_>>();

    EosFit {
        v0,
        e0,
        b0,
        fit_data: data.clone(),
        data,
        curve: Arc::new(ModelCurve {
            model: EosModel::Murnaghan,
            parameters: EosParameters {
                e0,
                v0,
                b0,
                b0_prime: 4.0,
            },
        }),
    }
}

fn zirconium() -> Vec<SingleCrystalEos> {
    vec![
        SingleCrystalEos::new("Zr", "pbe", "hcp", fit(-8.5, 156.0, 95.0)),
        SingleCrystalEos::new("Zr", "pbe", "bcc", fit(-8.4, 155.0, 90.0)),
        SingleCrystalEos::new("Zr", "tb", "hcp", fit(-9.0, 150.0, 110.0)),
        SingleCrystalEos::new("Zr", "tb", "fcc", fit(-8.8, 151.0, 100.0)),
        SingleCrystalEos::new("Mg", "pbe", "hcp", fit(-1.5, 155.5, 36.0)),
    ]
}

#[test]
fn grouped_by_element_then_method() {
    let elements = organize_eos_results(zirconium()).unwrap();
    assert_eq!(elements.len(), 2);

    let zr = &elements[0];
    assert_eq!(zr.element(), "Zr");
    assert_eq!(zr.methods(), ["pbe", "tb"]);
    assert_eq!(zr.structures(), ["hcp", "bcc", "fcc"]);
    assert_eq!(zr.groups()[1].label(), "Zr tb");
    assert_eq!(elements[1].methods(), ["pbe"]);
}

#[test]
fn delta_table_is_relative_to_the_best_method() {
    let elements = organize_eos_results(zirconium()).unwrap();
    let tables = elements[0].table_rows(3, true);

    let row = |method: &str, v0: &str, b0: &str, e0: &str| {
        [method, v0, b0, e0].map(str::to_owned)
    };

    assert_eq!(
        tables[0],
        StructureTable {
            structure: "hcp".to_owned(),
            rows: vec![
                row("pbe", "156.000", "95.000", "0.500"),
                row("tb", "150.000", "110.000", "0.000"),
            ],
        }
    );
    // a structure only one method computed is its own reference
    assert_eq!(tables[1].rows, [row("pbe", "155.000", "90.000", "0.000")]);

    let absolute = elements[0].table_rows(1, false);
    assert_eq!(absolute[2].rows, [row("tb", "151.0", "100.0", "-8.8")]);
}

#[test]
fn delta_plots_are_relative_to_the_best_structure() {
    let elements = organize_eos_results(zirconium()).unwrap();
    let plots = elements[0].plot_data(true);

    assert_eq!(plots[0].method, "pbe");
    let hcp = &plots[0].series[0];
    let bcc = &plots[0].series[1];
    assert_eq!(hcp.label, "hcp");

    // pbe minimum is hcp at -8.5
    assert!((hcp.data[2].1 - 0.0).abs() < 1e-12);
    assert!((bcc.data[2].1 - 0.1).abs() < 1e-12);
    assert_eq!(hcp.data.len(), 5);
}

#[test]
fn reference_curves_come_first() {
    let elements = organize_eos_results(zirconium()).unwrap();

    let plots = elements[0].make_plots(Some("tb")).unwrap();
    assert_eq!(plots.len(), 1);
    assert_eq!(plots[0].method, "pbe");
    assert_eq!(plots[0].reference.as_deref(), Some("tb"));

    let labels = plots[0]
        .series
        .iter()
        .map(|series| series.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, ["hcp", "fcc", "hcp", "bcc"]);

    assert_eq!(elements[0].make_plots(None).unwrap().len(), 2);
    assert!(matches!(
        elements[0].make_plots(Some("lda")),
        Err(Error::UnknownMethod(method)) if method == "lda"
    ));
}

#[test]
fn duplicate_structures_are_rejected() {
    let mut records = zirconium();
    records.push(SingleCrystalEos::new("Zr", "pbe", "hcp", fit(-8.6, 156.0, 95.0)));

    assert!(matches!(
        organize_eos_results(records),
        Err(Error::DuplicateStructure(structure)) if structure == "hcp"
    ));
}

#[test]
fn groups_are_validated_on_construction() {
    let records = zirconium();

    let mixed_methods = MultiCrystalEos::new("Zr", vec![records[0].clone(), records[2].clone()]);
    assert!(matches!(mixed_methods, Err(Error::MixedMethods(a, b)) if a == "pbe" && b == "tb"));

    let mixed_elements = MultiCrystalEos::new("pbe", vec![records[0].clone(), records[4].clone()]);
    assert!(matches!(mixed_elements, Err(Error::MixedElements(..))));

    assert!(matches!(MultiCrystalEos::new("empty", Vec::new()), Err(Error::NoRecords)));
}

#[test]
fn every_level_has_table_rows() {
    let records = zirconium();
    let single = EosRecord::Single(records[0].clone());
    assert_eq!(single.label(), "hcp");
    assert_eq!(single.table_rows(2)[0].rows[0][3], "-8.50");

    let multi = EosRecord::Multi(
        MultiCrystalEos::new("Zr pbe", vec![records[0].clone(), records[1].clone()]).unwrap(),
    );
    assert_eq!(multi.label(), "Zr pbe");
    assert_eq!(multi.table_rows(3).len(), 2);

    let element = EosRecord::Element(organize_eos_results(records).unwrap().remove(0));
    assert_eq!(element.label(), "Zr");
    assert_eq!(element.table_rows(3).len(), 3);
}
