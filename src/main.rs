//! Computes the chromatic number of a graph by distributed branch-and-bound

// #![warn(clippy::all, clippy::pedantic)]
// useful additional warnings if docs are missing, or crates imported but unused, etc.
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unsafe_code)]
#![warn(unused_extern_crates)]
#![warn(variant_size_differences)]

// not sure if already by default in clippy
#![warn(clippy::similar_names)]
#![warn(clippy::shadow_unrelated)]
#![warn(clippy::shadow_same)]
#![warn(clippy::shadow_reuse)]

use std::sync::Arc;
use std::time::Instant;

use clap::{load_yaml, App};
use serde_json::json;

use bnb_color::search::driver::{solve, SolveConfig, EXIT_NO_PARALLELISM};
use bnb_color::util::{export_results, load_graph, read_params};

/**
reads an instance (or samples a random one), then solves it exactly with one
coordinator rank and a pool of worker ranks.
*/
pub fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    // parse arguments
    let yaml = load_yaml!("main_args.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    let params = read_params(&main_args);

    println!("=========================================================");
    println!("reading instance: {}...", params.instance_name());
    let graph = match load_graph(&params) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    graph.display_statistics();
    println!("=========================================================");

    // solve it
    let config = SolveConfig { nb_procs: params.nb_procs, greedy_init: params.greedy_init };
    let t_start = Instant::now();
    let report = match solve(Arc::new(graph), config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let duration = t_start.elapsed().as_secs_f32();

    println!("==== optimal coloring ====");
    match &report.coloring {
        Some(coloring) => print!("{}", coloring),
        None => println!("(empty search)"),
    }
    println!("==========================");
    println!(
        "chromatic number: {} \t ({:.3} seconds, {} nodes explored by {} workers)",
        report.nb_colors, duration, report.explored, params.nb_procs - 1
    );

    // export statistics and solution
    let stats = json!({
        "nb_colors": report.nb_colors,
        "time_searched": duration,
        "explored": report.explored,
        "frontier": report.frontier_size,
        "nb_procs": params.nb_procs,
        "inst_name": params.instance_name(),
    });
    export_results(report.coloring.as_ref(), &stats, &params.perf_file, &params.sol_file);

    if report.serial {
        println!("NO PARALLELISM USED: the coordinator finished the search alone");
        std::process::exit(EXIT_NO_PARALLELISM);
    }
}
