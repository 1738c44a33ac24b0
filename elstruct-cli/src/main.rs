use std::{fs, fs::File, io::BufReader, path::PathBuf, time::Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use elstruct_core::{
    blocking::{blocking_stats_with, VarianceConvention},
    config::{BlockingConfig, EosFitConfig},
    eos::{fit_eos, EosModel, LevenbergMarquardt},
    hartree::radial_hartree,
    parse::{EnergySelector, ParserTable},
    probability::{adjacency_distribution, adjacency_probability, expected_adjacent},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit an equation of state to a set of output files
    Eos {
        /// Output files, one per volume
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// A json file with the fit options. Flags given on the command line take precedence
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// murnaghan, birch or vinet
        #[arg(long, short)]
        model: Option<EosModel>,
        /// The maximum number of iterations of the fitter
        #[arg(long)]
        max_iterations: Option<usize>,
        /// The energy field to use, `any` for the total energy with the cohesive energy as
        /// fallback
        #[arg(long, short)]
        energy: Option<String>,
        #[arg(long, default_value_t = 3)]
        decimals: usize,
    },
    /// Standard error of the mean of a correlated series
    Blocking {
        /// A file of whitespace separated numbers
        path: PathBuf,
        #[arg(long)]
        max_order: Option<usize>,
        /// Use sigma^2 / n - 1 for the variance of the mean
        #[arg(long)]
        legacy: bool,
    },
    /// Probability of markers landing on a set of adjacent sites
    Adjacency {
        /// Total number of sites
        #[arg(long, short = 'n')]
        sites: usize,
        /// Number of markers placed
        #[arg(long, short = 'k')]
        markers: usize,
        /// Size of the adjacent set
        #[arg(long, short = 'a', default_value_t = 6)]
        adjacent: usize,
        /// Only print the probability of exactly this many adjacent markers
        #[arg(long, short = 'm')]
        wanted: Option<usize>,
    },
    /// Hartree potential of a radial density
    Hartree {
        /// Two columns: r and the density at r
        path: PathBuf,
        /// The exponent step of the logarithmic grid
        #[arg(long)]
        mesh_parameter: f64,
    },
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args: Args = Args::parse();

    match args.command {
        Command::Eos {
            paths,
            config,
            model,
            max_iterations,
            energy,
            decimals,
        } => {
            let mut config = match config {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("could not open {}", path.display()))?;
                    serde_json::from_reader::<_, EosFitConfig>(BufReader::new(file))?
                }
                None => EosFitConfig::default(),
            };
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(max_iterations) = max_iterations {
                config.max_iterations = max_iterations;
            }
            if let Some(energy) = energy {
                config.energy_selector = EnergySelector::from(energy);
            }
            log::info!("fitting {} files with {config:?}", paths.len());

            let start = Instant::now();
            let fit = fit_eos(
                &ParserTable::with_defaults(),
                &LevenbergMarquardt::default(),
                &paths,
                &config,
            )?;

            println!("{} fit after {:0.2?}", config.model, start.elapsed());
            println!("v0 (bohr^3/atom): {:.*}", decimals, fit.v0);
            println!("e0 (eV/atom): {:.*}", decimals, fit.e0);
            println!("b0 (GPa): {:.*}", decimals, fit.b0);
        }

        Command::Blocking {
            path,
            max_order,
            legacy,
        } => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("could not read {}", path.display()))?;
            let series = contents
                .split_whitespace()
                .map(|value| value.parse::<f64>().with_context(|| format!("not a number: {value}")))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let config = BlockingConfig {
                max_order: max_order.unwrap_or(usize::MAX),
                convention: if legacy {
                    VarianceConvention::Legacy
                } else {
                    VarianceConvention::Corrected
                },
            };

            println!("{:>5} {:>14} {:>14} {:>14}", "order", "mean", "std mean", "std std mean");
            for record in blocking_stats_with(&series, &config)? {
                println!(
                    "{:>5} {:>14.6e} {:>14.6e} {:>14.6e}",
                    record.order, record.mean, record.std_mean, record.std_std_mean
                );
            }
        }

        Command::Adjacency {
            sites,
            markers,
            adjacent,
            wanted,
        } => match wanted {
            Some(wanted) => {
                let p = adjacency_probability(sites, markers, wanted, adjacent)?;
                println!("{p:.12}");
            }
            None => {
                for (wanted, p) in adjacency_distribution(sites, markers, adjacent)?
                    .into_iter()
                    .enumerate()
                {
                    println!("{wanted:>4} {p:.12}");
                }
                println!("expected: {:.6}", expected_adjacent(sites, markers, adjacent)?);
            }
        },

        Command::Hartree {
            path,
            mesh_parameter,
        } => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("could not read {}", path.display()))?;

            let mut density = Vec::new();
            for (number, line) in contents.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                let columns = line
                    .split_whitespace()
                    .map(str::parse::<f64>)
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("line {}: not a number", number + 1))?;
                let [r, rho] = columns[..] else {
                    bail!("line {}: expected two columns, got {}", number + 1, columns.len());
                };
                density.push((r, rho));
            }

            for (r, v) in radial_hartree(&density, mesh_parameter)? {
                println!("{r:>16.8e} {v:>16.8e}");
            }
        }
    }

    Ok(())
}
