use std::path::PathBuf;
use std::process::exit;

use clap::{load_yaml, App, ArgMatches};
use log::info;
use tokio::runtime::Runtime;

use pinconfig::{
    load_files, load_reference, Category, ConfigGraph, ConfigResult, ErrorExt, LoadError, LoaderOptions,
    TermLogger,
};

fn loader_options(matches: &ArgMatches) -> LoaderOptions {
    LoaderOptions {
        verify_version: !matches.is_present("no-version-check"),
        strict: !matches.is_present("lenient"),
        lowercase_keys: !matches.is_present("keep-case"),
    }
}

fn summary(graph: &ConfigGraph) -> String {
    let mut lines = vec![format!("config_version {}", graph.version())];
    if let Some(hardware) = graph.hardware() {
        lines.push(format!("platform {}", hardware.platform()));
    }
    for category in Category::ALL.iter() {
        lines.push(format!("{:>16} {}", category.key(), graph.count(*category)));
    }
    lines.join("\n")
}

/// Prints the outcome for one document, returns whether it loaded.
fn report(name: &str, result: Result<ConfigGraph, LoadError>, format: &str) -> ConfigResult<bool> {
    let graph = match result {
        Ok(graph) => graph,
        Err(e) => {
            println!("{}: invalid", name);
            println!("{}", e);
            return Ok(false);
        }
    };

    let output = match format {
        "json" => graph.to_json()?,
        "yaml" => graph.to_yaml()?,
        _ => summary(&graph),
    };
    println!("{}: ok", name);
    println!("{}", output);
    Ok(true)
}

fn run(matches: &ArgMatches) -> ConfigResult<bool> {
    let options = loader_options(matches);
    let format = matches.value_of("format").unwrap_or("summary");
    let mut all_valid = true;

    if matches.is_present("builtin") {
        all_valid &= report("builtin", load_reference(&options), format)?;
    }

    let paths: Vec<PathBuf> = matches
        .values_of("FILE")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();

    if !paths.is_empty() {
        let mut runtime = Runtime::new().prefix("Unable to start runtime")?;
        let results = runtime.block_on(load_files(&paths, &options));
        for (path, result) in paths.iter().zip(results) {
            all_valid &= report(&path.display().to_string(), result, format)?;
        }
    }

    info!("Checked {} document(s).", paths.len() + matches.is_present("builtin") as usize);
    Ok(all_valid)
}

fn exit_code(result: ConfigResult<bool>) -> i32 {
    match result {
        Ok(true) => 0,
        _ => 1,
    }
}

fn main() {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml).get_matches();

    if let Err(e) = TermLogger::init(TermLogger::level_for(matches.occurrences_of("verbose"))) {
        eprintln!("{}", e);
    }

    exit(exit_code(run(&matches).log()));
}
