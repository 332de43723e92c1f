use std::path::{Path, PathBuf};

use clap::Parser;
use hop::{Config, Error, ErrorReporter, Hop, MessageKind};

/// Runs a hop script.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print the parsed program to stderr before running it.
    #[arg(short, long)]
    debug: bool,

    /// Extra directories searched for imported modules.
    #[arg(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    script: PathBuf,
}

fn main() -> Result<(), anyhow::Error> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(64);
        }
        Err(e) => e.exit(),
    };

    // The script's own directory comes first
    let mut search_path = vec![];
    if let Some(dir) = args.script.parent() {
        search_path.push(dir.to_path_buf());
    }
    search_path.extend(args.include);

    let mut hop = Hop::with_config(Config::default().with_debug(args.debug))
        .with_module_resolver(move |name| find_module(&search_path, name));
    hop.subscribe(MessageKind::Stdout, |message| println!("{}", message.data));
    hop.subscribe(MessageKind::Debug, |message| eprintln!("{}", message.data));

    if let Err(e) = hop.run_file(&args.script) {
        let Some(error) = e.downcast_ref::<Error>() else {
            return Err(e);
        };

        let mut reporter = ErrorReporter::default();
        reporter.report(error);
        std::process::exit(reporter.exit_code());
    }

    Ok(())
}

fn find_module(search_path: &[PathBuf], name: &str) -> Option<String> {
    search_path
        .iter()
        .map(|dir| dir.join(format!("{name}.hop")))
        .find(|path| Path::is_file(path))
        .and_then(|path| std::fs::read_to_string(path).ok())
}
