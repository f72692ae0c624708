use clap::{Parser, Subcommand};
use modelang::{
    ast::{Directive, CLEAN_DIRECTIVE},
    compiler::{Compiler, FsLoader},
    config::{self, Config},
    eval::Engine,
    Error,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a model file and report what it defines
    Check { model: PathBuf },
    /// Validate a JSON document against a model file
    Validate {
        model: PathBuf,
        data: PathBuf,
        /// Only keep modeled paths in the output, as `@clean` does
        #[arg(long)]
        clean: bool,
    },
}

/// Returns the number of violations found.
fn run(cli: &Cli) -> Result<usize, Error> {
    let config = match &cli.config {
        Some(path) => config::from_file(path)?,
        None => Config::default(),
    };
    debug!("config: {:?}", config);

    let engine = Engine::new(config.engine.clone());
    let compiler: Compiler = engine
        .compiler(Box::new(FsLoader))
        .with_config(config.compiler.clone());

    match &cli.command {
        Command::Check { model } => {
            let model = compiler.compile_file(model)?;
            println!(
                "{} rules, {} types, {} directives",
                model.len(),
                model.types.len(),
                model.directives.len()
            );
            Ok(0)
        }
        Command::Validate { model, data, clean } => {
            let mut model = compiler.compile_file(model)?;
            if *clean && !model.is_clean() {
                model.directives.push(Directive {
                    name: CLEAN_DIRECTIVE.to_string(),
                    value: None,
                    line: 0,
                });
            }
            let text = std::fs::read_to_string(data)
                .map_err(|e| Error::internal(format!("Failed to read data file: {}", e)))?;
            let data: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| Error::internal(format!("Failed to parse data file: {}", e)))?;

            let result = engine.validate(&data, &model);
            let output = serde_json::to_string_pretty(&result)
                .map_err(|e| Error::internal(format!("Failed to render result: {}", e)))?;
            println!("{}", output);
            Ok(result.count)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(0) => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
