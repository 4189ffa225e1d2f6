#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "pvbridge", about = "Typed structured-value tools over JSON")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Build a value from a type descriptor and print its contents.
	Build(cmd::build::Args),
	/// Infer the field type a JSON value would take in a variant union.
	Guess(cmd::guess::Args),
	/// List the numbered fields of a type descriptor.
	Fields(cmd::fields::Args),
}

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_writer(std::io::stderr)
		.init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> cmd::error::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Build(args) => cmd::build::run(args),
		Commands::Guess(args) => cmd::guess::run(args),
		Commands::Fields(args) => cmd::fields::run(args),
	}
}
