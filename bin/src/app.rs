//! Application related stuff

use clap::Parser;
use layered_core::layers::DEFAULT_MAX_LAYERS;
use layered_core::pbrt::Float;
use layered_core::reflection::DEFAULT_TIR_PATH;

lazy_static! {
    /// The global application options.
    pub static ref OPTIONS: Options = Options::parse();
}

/// System wide options.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Layer stack description.
    #[arg(
        long,
        short = 's',
        value_name = "DESCRIPTION",
        conflicts_with = "stack_file",
        help = "Layer stack description, e.g. '{eta=1.5;alpha=0.1}{albedo=1,0.7,0.7;eta=0.5;kappa=3;alpha=0.2}'."
    )]
    pub stack: Option<String>,

    /// Path to a file holding the layer stack description.
    #[arg(
        long = "stack-file",
        short = 'f',
        value_name = "FILE",
        help = "Read the layer stack description from the given file."
    )]
    pub stack_file: Option<String>,

    /// Path to the total internal reflection table.
    #[arg(
        long,
        value_name = "FILE",
        default_value = DEFAULT_TIR_PATH,
        help = "Total internal reflection table."
    )]
    pub tir: String,

    /// Outgoing zenith angles in degrees.
    #[arg(
        long,
        short = 'a',
        value_name = "DEGREES",
        num_args = 1..,
        value_delimiter = ',',
        default_values_t = [0.0, 15.0, 30.0, 45.0, 60.0, 75.0],
        help = "Outgoing zenith angles in degrees."
    )]
    pub angles: Vec<Float>,

    /// Number of samples for the albedo estimate.
    #[arg(
        long,
        short = 'n',
        value_name = "NUM",
        default_value_t = 1024,
        help = "Number of samples used to estimate the directional albedo."
    )]
    pub samples: usize,

    /// Seed for the random number generators.
    #[arg(long, value_name = "NUM", default_value_t = 0, help = "Random seed.")]
    pub seed: u64,

    /// Number of threads to use.
    #[arg(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 1,
        help = "Use specified number of threads."
    )]
    n_threads: usize,

    /// Maximum number of layers.
    #[arg(
        long = "max-layers",
        value_name = "NUM",
        default_value_t = DEFAULT_MAX_LAYERS,
        help = "Maximum number of layers in the stack."
    )]
    pub max_layers: usize,

    /// Skip malformed parameters instead of failing.
    #[arg(long, help = "Skip malformed layer parameters with a warning.")]
    pub lenient: bool,

    /// Suppress all text output other than error messages.
    #[arg(long, short = 'q', help = "Suppress all text output other than error messages.")]
    pub quiet: bool,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            0 => {
                warn!("Invalid nthreads");
                1
            }
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            n => n,
        }
    }
}
