//! Probabilities for markers dropped at random onto the sites of a lattice, counted by how
//! many land on a designated set of adjacent sites.
use crate::error::{Error, Result};

/// Nearest neighbours of a site in a close-packed plane
pub const HEXAGONAL_NEIGHBOURS: usize = 6;

fn check_fill(sites: usize, markers: usize, adjacent: usize) -> Result<()> {
    if sites == 0 || markers > sites || adjacent > sites {
        return Err(Error::ImpossibleFill {
            sites,
            markers,
            adjacent,
        });
    }
    Ok(())
}

/// Probability that exactly `wanted` of `markers` markers, placed uniformly at random on
/// distinct sites out of `sites`, fall on a fixed set of `adjacent` sites.
pub fn adjacency_probability(
    sites: usize,
    markers: usize,
    wanted: usize,
    adjacent: usize,
) -> Result<f64> {
    check_fill(sites, markers, adjacent)?;

    if wanted > markers || wanted > adjacent {
        return Ok(0.0);
    }

    let (n, a) = (sites as f64, adjacent as f64);

    let on_adjacent = (0..wanted)
        .map(|i| (a - i as f64) / (n - i as f64))
        .product::<f64>();
    let elsewhere = (0..markers - wanted)
        .map(|j| (n - a - j as f64) / (n - (wanted + j) as f64))
        .product::<f64>();

    Ok(binomial(markers, wanted) * on_adjacent * elsewhere)
}

/// [`adjacency_probability`] for every possible count, `0..=markers`.
pub fn adjacency_distribution(sites: usize, markers: usize, adjacent: usize) -> Result<Vec<f64>> {
    (0..=markers)
        .map(|wanted| adjacency_probability(sites, markers, wanted, adjacent))
        .collect()
}

/// Mean number of markers on the adjacent sites, k A / N.
pub fn expected_adjacent(sites: usize, markers: usize, adjacent: usize) -> Result<f64> {
    check_fill(sites, markers, adjacent)?;
    Ok(markers as f64 * adjacent as f64 / sites as f64)
}

fn binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::Rng;

    use super::{
        adjacency_distribution, adjacency_probability, binomial, expected_adjacent,
        HEXAGONAL_NEIGHBOURS,
    };
    use crate::error::Error;

    #[test]
    fn none_adjacent() {
        let p = adjacency_probability(35, 3, 0, HEXAGONAL_NEIGHBOURS).unwrap();
        assert_relative_eq!(p, (29.0 / 35.0) * (28.0 / 34.0) * (27.0 / 33.0), epsilon = 1e-14);
    }

    #[test]
    fn two_adjacent() {
        let p = adjacency_probability(35, 3, 2, HEXAGONAL_NEIGHBOURS).unwrap();
        assert_relative_eq!(p, 3.0 * (6.0 / 35.0) * (5.0 / 34.0) * (29.0 / 33.0), epsilon = 1e-14);
    }

    #[test]
    fn more_markers_than_sites() {
        assert!(matches!(
            adjacency_probability(35, 37, 0, HEXAGONAL_NEIGHBOURS),
            Err(Error::ImpossibleFill {
                sites: 35,
                markers: 37,
                adjacent: 6
            })
        ));
        assert!(adjacency_probability(0, 0, 0, 0).is_err());
        assert!(adjacency_probability(4, 2, 0, 5).is_err());
    }

    #[test]
    fn impossible_counts_have_zero_probability() {
        assert_eq!(adjacency_probability(35, 3, 4, 6).unwrap(), 0.0);
        assert_eq!(adjacency_probability(35, 10, 7, 6).unwrap(), 0.0);
    }

    #[test]
    fn binomials() {
        assert_eq!(binomial(5, 0), 1.0);
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(10, 7), 120.0);
    }

    #[test]
    fn distribution_is_normalised() {
        let mut rng = rand::thread_rng();

        for _ in 0..500 {
            let sites = rng.gen_range(1..=60);
            let markers = rng.gen_range(0..=sites);
            let adjacent = rng.gen_range(1..=sites);

            let distribution = adjacency_distribution(sites, markers, adjacent).unwrap();
            assert_eq!(distribution.len(), markers + 1);
            assert!(distribution.iter().all(|p| (0.0..=1.0 + 1e-12).contains(p)));
            assert_relative_eq!(distribution.iter().sum::<f64>(), 1.0, epsilon = 1e-12);

            let mean = distribution
                .iter()
                .enumerate()
                .map(|(m, p)| m as f64 * p)
                .sum::<f64>();
            assert_relative_eq!(
                mean,
                expected_adjacent(sites, markers, adjacent).unwrap(),
                epsilon = 1e-10
            );
        }
    }
}
