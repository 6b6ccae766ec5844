use tracing::{error, info};
use tracing_subscriber;

use clap::{value_t, App, Arg};

use snowdag::avalanche::Transaction;
use snowdag::dot;
use snowdag::id::NodeId;
use snowdag::network::Network;
use snowdag::params::Parameters;
use snowdag::simulation::{ConflictViolation, Simulation};
use snowdag::Result;

use std::path::PathBuf;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_level(false)
        .with_target(false)
        .without_time()
        .compact()
        .with_max_level(tracing::Level::INFO)
        .init();

    let matches = App::new("snowdag")
        .version("0.1")
        .author("zero.fx labs ltd.")
        .about("Simulates Avalanche consensus over a DAG of transactions")
        .arg(
            Arg::with_name("nodes")
                .short("n")
                .long("nodes")
                .value_name("NODES")
                .default_value("50")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("iterations")
                .short("i")
                .long("iterations")
                .value_name("ITERATIONS")
                .default_value("50")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("double-spend-rate")
                .short("d")
                .long("double-spend-rate")
                .value_name("RATE")
                .default_value("0.02")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .default_value("23")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("params")
                .short("p")
                .long("params")
                .value_name("PARAMS_FILE")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("dot-dir")
                .long("dot-dir")
                .value_name("DOT_DIR")
                .help("Writes the view of node-0 after every step as a graphviz file")
                .takes_value(true)
                .required(false),
        )
        .get_matches();

    let nodes = value_t!(matches.value_of("nodes"), usize).unwrap_or_else(|e| e.exit());
    let iterations = value_t!(matches.value_of("iterations"), usize).unwrap_or_else(|e| e.exit());
    let double_spend_rate =
        value_t!(matches.value_of("double-spend-rate"), f64).unwrap_or_else(|e| e.exit());
    let seed = value_t!(matches.value_of("seed"), u64).unwrap_or_else(|e| e.exit());
    let params = match matches.value_of("params") {
        Some(path) => Parameters::from_file(path)?,
        None => Parameters::default(),
    };
    let dot_dir = matches.value_of("dot-dir").map(PathBuf::from);

    if nodes < 2 {
        clap::Error::with_description("at least 2 nodes are needed", clap::ErrorKind::InvalidValue)
            .exit();
    }

    let sys = actix::System::new();
    let violations =
        sys.block_on(run(nodes, iterations, double_spend_rate, seed, params, dot_dir))?;

    if violations.is_empty() {
        info!("no conflicting transactions were accepted");
        Ok(())
    } else {
        for violation in violations.iter() {
            error!("double spend accepted: {}", violation);
        }
        std::process::exit(1);
    }
}

async fn run(
    nodes: usize,
    iterations: usize,
    double_spend_rate: f64,
    seed: u64,
    params: Parameters,
    dot_dir: Option<PathBuf>,
) -> Result<Vec<ConflictViolation>> {
    let genesis = Transaction::genesis(params.genesis_data);
    let network = Network::create(nodes, genesis, params, seed)?;
    let mut simulation = Simulation::new(network, double_spend_rate, seed);

    for step in 0..iterations {
        let _ = simulation.step().await?;
        if let Some(dir) = dot_dir.as_ref() {
            let snapshot = simulation.network().snapshot(NodeId(0)).await?;
            dot::write(dir.join(format!("node-0-{:03}.dot", step)), &snapshot)?;
        }
    }
    simulation.conflict_violations().await
}
