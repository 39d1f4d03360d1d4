use std::{
	fs,
	io::{self, Read},
	path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use sift_domain::{ArgsMap, WidgetState};
use sift_service::{Description, Error, QueryResponse, SiftService};

#[derive(Debug, Parser)]
#[command(
	version = sift_cli::VERSION,
	rename_all = "kebab",
	styles = sift_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Validate widget state and print the argument map.
	Build {
		/// Widget state JSON, or `-` for stdin.
		#[arg(long, short = 's', value_name = "FILE")]
		state: PathBuf,
		#[arg(long, value_name = "NAME")]
		profile: Option<String>,
		/// Save under the configured default profile when no profile is given.
		#[arg(long)]
		save: bool,
	},
	/// Render an argument map as texts and widget state.
	Describe {
		#[arg(long, short = 'a', value_name = "FILE")]
		args: PathBuf,
	},
	/// Restore a saved profile.
	Restore { profile: Option<String> },
	/// List saved profiles, newest first.
	Recent,
	/// Build from widget state and run the query.
	Query {
		#[arg(long, short = 's', value_name = "FILE")]
		state: PathBuf,
		#[arg(long, value_name = "N", default_value_t = 1)]
		page: u32,
		#[arg(long, value_name = "FIELD")]
		order: Option<String>,
		#[arg(long, value_name = "NAME")]
		profile: Option<String>,
	},
}

#[derive(Debug, Serialize)]
struct Outcome {
	ok: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	args: Option<ArgsMap>,
	#[serde(skip_serializing_if = "Option::is_none")]
	response: Option<QueryResponse>,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<String>,
}
impl Outcome {
	fn built(args: ArgsMap) -> Self {
		Self { ok: true, args: Some(args), response: None, message: None }
	}

	fn failed(message: String) -> Self {
		Self { ok: false, args: None, response: None, message: Some(message) }
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;
	init_tracing(&config)?;
	let service = SiftService::new(&config)?;
	let output = execute(&service, &args.command).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

/// Runs one command and returns the JSON document to print.
///
/// Build, status and transport failures are reported as `{ "ok": false, "message": ... }`.
/// Configuration and I/O failures are returned as errors.
pub async fn execute(service: &SiftService, command: &Command) -> color_eyre::Result<Value> {
	let output = match command {
		Command::Build { state, profile, save } => {
			let state = read_state(state)?;
			let profile = profile
				.as_deref()
				.or_else(|| save.then(|| service.default_profile()));

			match service.build(&state, profile) {
				Ok(args) => serde_json::to_value(Outcome::built(args))?,
				Err(err) => failure(err)?,
			}
		},
		Command::Describe { args } => {
			let raw = read_input(args)?;
			let args: ArgsMap = serde_json::from_str(&raw)?;

			serde_json::to_value(service.describe(&args))?
		},
		Command::Restore { profile } => {
			let profile = profile.as_deref().unwrap_or(service.default_profile());
			let restored: Option<Description> = service.restore(profile)?;

			let Some(description) = restored else {
				return Err(eyre::eyre!("Profile '{profile}' has no saved search."));
			};

			serde_json::to_value(description)?
		},
		Command::Recent => serde_json::to_value(service.recent()?)?,
		Command::Query { state, page, order, profile } => {
			let state = read_state(state)?;

			service.guard().set_order(order.clone());

			match query(service, &state, *page, profile.as_deref()).await {
				Ok((args, response)) => serde_json::to_value(Outcome {
					response: Some(response),
					..Outcome::built(args)
				})?,
				Err(err) => failure(err)?,
			}
		},
	};

	Ok(output)
}

async fn query(
	service: &SiftService,
	state: &WidgetState,
	page: u32,
	profile: Option<&str>,
) -> sift_service::Result<(ArgsMap, QueryResponse)> {
	let (args, first) = service.search(state, profile).await?;

	if page <= 1 {
		return Ok((args, first));
	}

	let response = service.guard().page(page).await?;

	Ok((args, response))
}

fn failure(err: Error) -> color_eyre::Result<Value> {
	match err {
		Error::Build(_) | Error::Status { .. } | Error::Transport { .. } => {
			tracing::debug!(error = %err, "Command failed.");

			Ok(serde_json::to_value(Outcome::failed(err.to_string()))?)
		},
		other => Err(other.into()),
	}
}

fn read_state(path: &Path) -> color_eyre::Result<WidgetState> {
	let raw = read_input(path)?;

	Ok(serde_json::from_str(&raw)?)
}

fn read_input(path: &Path) -> color_eyre::Result<String> {
	if path.as_os_str() == "-" {
		let mut raw = String::new();

		io::stdin().read_to_string(&mut raw)?;

		return Ok(raw);
	}

	Ok(fs::read_to_string(path)?)
}

fn init_tracing(config: &sift_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
	Ok(())
}
