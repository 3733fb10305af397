#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod app;

use app::*;
use layered_api::parser::*;
use layered_api::*;
use layered_core::bsdf::*;
use layered_core::geometry::*;
use layered_core::layers::*;
use layered_core::pbrt::*;
use layered_core::reflection::*;
use layered_core::rng::*;
use layered_core::spectrum::*;
use std::sync::Arc;
use std::thread;

/// Lobes and albedo estimate for one outgoing angle.
struct AngleReport {
    /// Zenith angle in degrees.
    degrees: Float,

    /// Lobes returned by the solver.
    lobes: Lobes,

    /// Monte Carlo estimate of the directional albedo.
    albedo: Spectrum,
}

fn main() {
    // Initialize `env_logger`.
    env_logger::init();

    if let Err(e) = run(&OPTIONS) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), String> {
    let tir = Arc::new(TIRLookup::load(&options.tir));

    let parser = LayerStackParser::new()
        .with_max_layers(options.max_layers)
        .lenient(options.lenient);

    let bsdf = match (&options.stack, &options.stack_file) {
        (_, Some(path)) => {
            let stack = parser.parse_file(path).map_err(|e| e.to_string())?;
            LayeredBSDF::new(stack, tir)
        }
        (Some(description), None) => LayeredMaterial::with_parser(description, tir, &parser)
            .map_err(|e| e.to_string())?
            .bsdf()
            .clone(),
        (None, None) => {
            // Clear coat over a tinted metal.
            let description = add(
                &LayerRecord::default_dielectric().to_string(),
                &LayerRecord::default_metal().to_string(),
            );
            info!("No layer stack given, using '{description}'");
            LayeredMaterial::with_parser(&description, tir, &parser)
                .map_err(|e| e.to_string())?
                .bsdf()
                .clone()
        }
    };
    debug!("{}", bsdf);

    let angles: Vec<Float> = options
        .angles
        .iter()
        .copied()
        .filter(|&degrees| {
            let valid = (0.0..90.0).contains(&degrees);
            if !valid {
                warn!("Skipping angle {degrees} outside [0, 90)");
            }
            valid
        })
        .collect();

    let reports = sweep(&bsdf, &angles, options.samples, options.seed, options.threads())?;
    if !options.quiet {
        print_reports(&reports);
    }
    Ok(())
}

/// Solves the stack for each angle and estimates the directional albedo.
/// Every angle draws from its own generator so results do not depend on the
/// number of threads.
///
/// * `bsdf`      - The BSDF.
/// * `angles`    - Outgoing zenith angles in degrees.
/// * `samples`   - Number of albedo samples per angle.
/// * `seed`      - Base seed.
/// * `n_threads` - Number of worker threads.
fn sweep(
    bsdf: &LayeredBSDF,
    angles: &[Float],
    samples: usize,
    seed: u64,
    n_threads: usize,
) -> Result<Vec<AngleReport>, String> {
    if angles.is_empty() {
        return Ok(vec![]);
    }

    let n_threads = n_threads.max(1);
    let chunk_size = (angles.len() + n_threads - 1) / n_threads;
    let n = Vector3f::new(0.0, 0.0, 1.0);

    thread::scope(|s| -> Result<Vec<AngleReport>, String> {
        let handles: Vec<_> = angles
            .chunks(chunk_size)
            .enumerate()
            .map(|(chunk, degrees)| {
                let n = &n;
                s.spawn(move || {
                    degrees
                        .iter()
                        .enumerate()
                        .map(|(i, &degrees)| {
                            let k = (chunk * chunk_size + i) as u64;
                            let theta = radians(degrees);
                            let wo = Vector3f::new(sin(theta), 0.0, cos(theta));
                            let mut rng = seeded_rng(seed.wrapping_add(k));
                            AngleReport {
                                degrees,
                                lobes: bsdf.lobes(wo.dot(n)),
                                albedo: bsdf.directional_albedo(&wo, n, samples, &mut rng),
                            }
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut reports = Vec::with_capacity(angles.len());
        for handle in handles {
            let chunk = handle
                .join()
                .map_err(|_| String::from("Worker thread panicked"))?;
            reports.extend(chunk);
        }
        Ok(reports)
    })
}

fn print_reports(reports: &[AngleReport]) {
    for report in reports {
        println!("theta = {:.1}", report.degrees);
        for (i, lobe) in report.lobes.iter().enumerate() {
            println!(
                "  lobe {i}: coefficient = {}, alpha = {:.4}, weight = {:.4}",
                lobe.coefficient,
                lobe.alpha,
                lobe.weight()
            );
        }
        println!("  albedo = {}", report.albedo);
    }
}
