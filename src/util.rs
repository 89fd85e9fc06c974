use clap::ArgMatches;
use serde_json::Value;

use crate::graph::{Graph, GraphError, Partition};
use crate::search::node::PartialColoring;

/// where the instance comes from
#[derive(Debug, Clone)]
pub enum InstanceSource {
    /// a DIMACS `.col` file, with an optional declared-order cross-check
    Dimacs {
        /// instance file path
        path: String,
        /// expected number of vertices, if the caller knows it
        expected_order: Option<usize>,
    },
    /// a Bernoulli random graph
    Random {
        /// number of vertices
        n: usize,
        /// edge probability
        p: f64,
        /// generator seed
        seed: u64,
    },
}

/// decoded command line parameters of the main executable
#[derive(Debug, Clone)]
pub struct RunParams {
    /// instance to solve
    pub source: InstanceSource,
    /// number of ranks
    pub nb_procs: usize,
    /// seed the bound with a greedy DSATUR coloring
    pub greedy_init: bool,
    /// file where the optimal coloring is written
    pub sol_file: Option<String>,
    /// file where run statistics are written
    pub perf_file: Option<String>,
}

impl RunParams {
    /// short instance name for logs and stat files
    pub fn instance_name(&self) -> String {
        match &self.source {
            InstanceSource::Dimacs { path, .. } => path.clone(),
            InstanceSource::Random { n, p, seed } => format!("random({},{},{})", n, p, seed),
        }
    }
}

/** reads command line input.

# Panics
 - if a numeric argument cannot be parsed
*/
pub fn read_params(main_args: &ArgMatches) -> RunParams {
    let source = match main_args.values_of("random") {
        Some(mut values) => {
            let n = values.next().unwrap().parse::<usize>()
                .expect("unable to parse the random graph order");
            let p = values.next().unwrap().parse::<f64>()
                .expect("unable to parse the random edge probability");
            let seed = values.next().unwrap().parse::<u64>()
                .expect("unable to parse the random seed");
            InstanceSource::Random { n, p, seed }
        }
        None => {
            let path = main_args.value_of("instance")
                .expect("no instance given").to_string();
            let expected_order = main_args.value_of("order").map(|v| {
                v.parse::<usize>().expect("unable to parse the expected order")
            });
            InstanceSource::Dimacs { path, expected_order }
        }
    };
    let nb_procs = main_args.value_of("procs").unwrap().parse::<usize>()
        .expect("unable to parse the number of ranks");
    RunParams {
        source,
        nb_procs,
        greedy_init: main_args.is_present("greedy"),
        sol_file: main_args.value_of("solution").map(|e| e.to_string()),
        perf_file: main_args.value_of("perf").map(|e| e.to_string()),
    }
}

/// builds the graph the parameters describe
pub fn load_graph(params: &RunParams) -> Result<Graph, GraphError> {
    match &params.source {
        InstanceSource::Dimacs { path, expected_order } => {
            Graph::from_dimacs(path, *expected_order)
        }
        InstanceSource::Random { n, p, seed } => Ok(Graph::random(*n, *p, *seed)),
    }
}

/** writes a string encoding the partition (use this to export the solution) */
pub fn solution_to_string(partition: &Partition) -> String {
    let mut res = String::default();
    for class in partition {
        for v in class {
            res += format!("{} ", v).as_str();
        }
        res += "\n";
    }
    res
}

/// exports search results to files
pub fn export_results(
    coloring: Option<&PartialColoring>,
    stats: &Value,
    perf_file: &Option<String>,
    sol_file: &Option<String>,
) {
    // export statistics
    match perf_file {
        None => {}
        Some(filename) => {
            let mut file = match std::fs::File::create(filename.as_str()) {
                Err(why) => panic!("couldn't create {}: {}", filename, why),
                Ok(file) => file,
            };
            if let Err(why) = std::io::Write::write(
                &mut file, serde_json::to_string(stats).unwrap().as_bytes(),
            ) { panic!("couldn't write: {}", why) };
        }
    }
    // export solution
    match (sol_file, coloring) {
        (Some(filename), Some(solution)) => {
            std::fs::write(filename, solution_to_string(&solution.partition()))
                .unwrap_or_else(|_| {
                    panic!("export_results: unable to write the solution in {}", filename)
                });
        }
        _ => {}
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_to_string() {
        let partition = vec![vec![0, 2], vec![1]];
        assert_eq!(solution_to_string(&partition), "0 2 \n1 \n");
    }

    #[test]
    fn test_instance_name_of_a_random_source() {
        let params = RunParams {
            source: InstanceSource::Random { n: 10, p: 0.5, seed: 3 },
            nb_procs: 4,
            greedy_init: false,
            sol_file: None,
            perf_file: None,
        };
        assert_eq!(params.instance_name(), "random(10,0.5,3)");
    }
}
