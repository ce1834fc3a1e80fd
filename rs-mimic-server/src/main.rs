use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::middleware::{Condition, Logger};
use actix_web::{App, HttpServer, web};
use clap::Parser;
use log::{info, warn};
use rs_mimic_core::MimicError;

mod config;
mod routes;

use config::ServerConfig;
use routes::AppState;

#[derive(Parser)]
#[command(about = "HTTP host for the per-author text mimicry engine")]
struct Args {
	/// TOML config file; defaults are used when it does not exist.
	#[arg(long, default_value = "mimic.toml")]
	config: PathBuf,
}

#[derive(Debug, thiserror::Error)]
enum ServerError {
	#[error(transparent)]
	Mimic(#[from] MimicError),
	#[error("http server: {0}")]
	Io(#[from] std::io::Error),
}

/// Main entry point for the server.
///
/// Loads the config and the corpus snapshot, then starts an Actix-web HTTP
/// server. The snapshot is rewritten once the server has shut down.
#[actix_web::main]
async fn main() -> Result<(), ServerError> {
	let args = Args::parse();
	let config = ServerConfig::load(&args.config)?;

	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.filter.as_str())).init();
	if !args.config.exists() {
		warn!("No config at {}, using defaults", args.config.display());
	}

	let state = web::Data::new(AppState::from_config(&config)?);
	let shared_state = state.clone();
	let cors = config.http.cors;

	info!("Listening on {}:{}", config.http.host, config.http.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Condition::new(cors, Cors::permissive()))
			.app_data(shared_state.clone())
			.configure(routes::configure)
	})
		.bind((config.http.host.as_str(), config.http.port))?
		.run()
		.await?;

	state.save()?;
	info!("Saved corpus on shutdown");
	Ok(())
}
