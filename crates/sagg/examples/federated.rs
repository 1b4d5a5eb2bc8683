// Two-party demo of the Byzantine-robust SignSGD aggregation pipeline.
//
// This example demonstrates:
// - The coordinator and the data party running the four stages in lockstep
//   on two threads connected by an in-memory link
// - The ideal reference engine standing in for a cryptographic backend
// - Per-stage timing on the coordinator side
// - Reconstruction of the aggregate and verification against the plaintext
//   reference computation

mod util;

use std::{env, error::Error, process::exit, thread};

use console::style;
use rand::{rngs::OsRng, thread_rng, Rng};
use sagg::ideal::{reveal_ring, verify, IdealCompute, LocalLink};
use sagg::{AggParametersBuilder, Aggregator, Role};
use sagg_math::BitShare;
use sagg_util::sample_bits;

fn print_notice_and_exit(error: Option<String>) {
    println!(
        "{} Byzantine-robust secure aggregation for SignSGD",
        style("  overview:").magenta().bold()
    );
    println!(
        "{} federated [-h] [--help] [--num_users=<value>] [--dim_grad=<value>] [--threshold_ratio=<value>] [--num_threads=<value>]",
        style("     usage:").magenta().bold()
    );
    println!(
        "{} {} and {} must be at least 1, {} in [0, 1], {} in 1..=4",
        style("constraints:").magenta().bold(),
        style("num_users").blue(),
        style("dim_grad").blue(),
        style("threshold_ratio").blue(),
        style("num_threads").blue(),
    );
    if let Some(error) = error {
        println!("{} {}", style("     error:").red().bold(), error);
    }
    exit(0);
}

fn main() -> Result<(), Box<dyn Error>> {
    // Command line argument parsing
    let args: Vec<String> = env::args().skip(1).collect();

    // Print help if requested
    if args.contains(&"-h".to_string()) || args.contains(&"--help".to_string()) {
        print_notice_and_exit(None)
    }

    let mut num_users = 10;
    let mut dim_grad = 5000;
    let mut threshold_ratio = 0.5;
    let mut num_threads = 1;

    // Parse command line arguments
    for arg in &args {
        if arg.starts_with("--num_users") {
            let parts: Vec<&str> = arg.rsplit('=').collect();
            if parts.len() != 2 || parts[0].parse::<usize>().is_err() {
                print_notice_and_exit(Some("Invalid `--num_users` argument".to_string()))
            } else {
                num_users = parts[0].parse::<usize>()?
            }
        } else if arg.starts_with("--dim_grad") {
            let parts: Vec<&str> = arg.rsplit('=').collect();
            if parts.len() != 2 || parts[0].parse::<usize>().is_err() {
                print_notice_and_exit(Some("Invalid `--dim_grad` argument".to_string()))
            } else {
                dim_grad = parts[0].parse::<usize>()?
            }
        } else if arg.starts_with("--threshold_ratio") {
            let parts: Vec<&str> = arg.rsplit('=').collect();
            if parts.len() != 2 || parts[0].parse::<f64>().is_err() {
                print_notice_and_exit(Some("Invalid `--threshold_ratio` argument".to_string()))
            } else {
                threshold_ratio = parts[0].parse::<f64>()?
            }
        } else if arg.starts_with("--num_threads") {
            let parts: Vec<&str> = arg.rsplit('=').collect();
            if parts.len() != 2 || parts[0].parse::<usize>().is_err() {
                print_notice_and_exit(Some("Invalid `--num_threads` argument".to_string()))
            } else {
                num_threads = parts[0].parse::<usize>()?
            }
        } else {
            print_notice_and_exit(Some(format!("Unrecognized argument: {arg}")))
        }
    }

    // Validate the configuration before any protocol work
    let params = match AggParametersBuilder::new()
        .set_num_users(num_users)
        .set_dim_grad(dim_grad)
        .set_threshold_ratio(threshold_ratio)
        .set_num_threads(num_threads)
        .build_arc()
    {
        Ok(params) => params,
        Err(e) => {
            print_notice_and_exit(Some(e.to_string()));
            unreachable!()
        }
    };

    // Display the run configuration
    println!("# Byzantine-robust secure aggregation for SignSGD");
    println!("\tnum_users = {num_users}");
    println!("\tdim_grad = {dim_grad}");
    println!(
        "\tthreshold = {} (ratio {threshold_ratio})",
        params.threshold()
    );
    println!(
        "\tscore ring = 2^{}, output ring = 2^{}",
        params.score_width(),
        params.output_width()
    );

    // Plaintext inputs: the coordinator's reference sign vector and the
    // concatenated client sign vectors held by the data party. The client
    // matrix is XOR-shared uniformly between the parties, as in a real
    // deployment where clients deal their bits to both servers.
    let reference = sample_bits(dim_grad, &mut OsRng);
    let clients = sample_bits(num_users * dim_grad, &mut OsRng);
    let client_mask = sample_bits(num_users * dim_grad, &mut OsRng);
    let client_data: Vec<u8> = clients
        .iter()
        .zip(&client_mask)
        .map(|(c, m)| c ^ m)
        .collect();

    let seed: u64 = thread_rng().gen();
    let (link_c, link_d) = LocalLink::pair();

    // The data party runs silently on its own thread.
    let params_d = params.clone();
    let handle = thread::spawn(move || -> sagg::Result<Vec<u64>> {
        let reference_share = BitShare::zero(params_d.dim_grad());
        let client_share = BitShare::new(client_data);
        let engine = IdealCompute::new(Role::Data, link_d, seed);
        let mut pipeline = Aggregator::new(params_d, Role::Data, engine)?;

        let agreement = pipeline.sign_agreement(&reference_share, &client_share)?;
        let scores = pipeline.trust_scores(agreement)?;
        let weights = pipeline.filter_byzantine(scores)?;
        let output = pipeline.weighted_aggregate(&client_share, weights)?;

        let mut engine = pipeline.into_engine();
        reveal_ring(&output, engine.link_mut(), None)
    });

    // The coordinator reports per-stage timings.
    let reference_share = BitShare::new(reference.clone());
    let client_share = BitShare::new(client_mask);
    let engine = IdealCompute::new(Role::Coordinator, link_c, seed);
    let mut pipeline = Aggregator::new(params.clone(), Role::Coordinator, engine)?;

    let agreement = timeit!(
        "Step 1 (sign agreement)",
        pipeline.sign_agreement(&reference_share, &client_share)?
    );
    let scores = timeit!("Step 2 (trust scores)", pipeline.trust_scores(agreement)?);
    let weights = timeit!(
        "Step 3 (Byzantine filter)",
        pipeline.filter_byzantine(scores)?
    );
    let output = timeit!(
        "Step 4 (weighted aggregation)",
        pipeline.weighted_aggregate(&client_share, weights)?
    );

    let mut engine = pipeline.into_engine();
    let bound = (num_users * dim_grad) as u64;
    let aggregate = timeit!(
        "Reveal",
        reveal_ring(&output, engine.link_mut(), Some(bound))?
    );
    let from_data = handle.join().expect("data party panicked")?;

    // Verify against the plaintext reference computation.
    let expected =
        verify::expected_pipeline(&reference, &clients, num_users, dim_grad, params.threshold());
    if aggregate == expected && from_data == expected {
        println!(
            "{}",
            style("Aggregate matches the plaintext reference ✔").green()
        );
        Ok(())
    } else {
        println!(
            "{}",
            style("Aggregate DOES NOT match the plaintext reference ✘")
                .red()
                .bold()
        );
        exit(1)
    }
}
