//! Benchmarks the distributed search on Bernoulli random graphs

use std::sync::Arc;
use std::time::Instant;

use clap::{load_yaml, App};
use serde_json::json;

use bnb_color::graph::Graph;
use bnb_color::search::driver::{solve, SolveConfig};

/** solves a series of random instances and prints one JSON stat line per run.

# Panics
 - if an argument cannot be parsed
*/
pub fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));
    // parse arguments
    let yaml = load_yaml!("random_bench.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    let n = main_args.value_of("n").unwrap().parse::<usize>()
        .expect("unable to parse the graph order");
    let p = main_args.value_of("p").unwrap().parse::<f64>()
        .expect("unable to parse the edge probability");
    let runs = main_args.value_of("runs").unwrap().parse::<u64>()
        .expect("unable to parse the number of runs");
    let nb_procs = main_args.value_of("procs").unwrap().parse::<usize>()
        .expect("unable to parse the number of ranks");
    let config = SolveConfig { nb_procs, greedy_init: main_args.is_present("greedy") };

    for seed in 0..runs {
        let graph = Arc::new(Graph::random(n, p, seed));
        let t_start = Instant::now();
        let report = match solve(graph, config) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };
        let duration = t_start.elapsed().as_secs_f32();
        let stats = json!({
            "inst_name": format!("random({},{},{})", n, p, seed),
            "nb_colors": report.nb_colors,
            "time_searched": duration,
            "explored": report.explored,
            "frontier": report.frontier_size,
            "serial": report.serial,
        });
        println!("{}", stats);
    }
}
