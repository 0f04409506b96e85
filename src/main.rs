use clap::{value_parser, Arg, ArgAction, Command};
use lsi::{Dispatcher, Options};
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    init_tracing();

    let matches = Command::new("lsi")
        .about("Interpreter for indentation-grouped line scripts")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print statement results, not execution trace lines")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .value_name("N")
                .help("Stop any single while loop after N iterations")
                .value_parser(value_parser!(u64)),
        )
        .get_matches();

    let options = Options {
        trace: !matches.get_flag("quiet"),
        max_loop_iterations: matches.get_one::<u64>("max-iterations").copied(),
    };

    if let Some(file_path) = matches.get_one::<String>("file") {
        run_file(file_path, options);
    }
}

/// Logs go to stderr and only when `RUST_LOG` is set, e.g.
/// `RUST_LOG=lsi=debug`.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_file(path: &str, options: Options) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found.", path.display());
        process::exit(1);
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            process::exit(1);
        }
    };

    let filename = path.to_string_lossy();
    let mut dispatcher = Dispatcher::stdio(options);
    if lsi::run(&source, Some(filename.as_ref()), &mut dispatcher).is_err() {
        process::exit(1);
    }
}
