use std::path::PathBuf;

use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use log::{error, info};
use rs_mimic_core::{AuthorId, CorpusStore, GenerationInput, Generator, Result, SnapshotFormat};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

/// State shared by every worker.
pub struct AppState {
	pub store: CorpusStore,
	pub order: usize,
	pub generation: GenerationInput,
	pub snapshot: PathBuf,
	pub format: SnapshotFormat,
	pub default_author: Option<AuthorId>,
}

impl AppState {
	/// Opens (or bootstraps) the snapshot named by the config.
	///
	/// # Errors
	/// Fails on invalid settings or on an existing but malformed snapshot.
	pub fn from_config(config: &ServerConfig) -> Result<Self> {
		let snapshot = config.storage.snapshot.clone();
		let format = SnapshotFormat::from_path(&snapshot);
		let store = CorpusStore::open(&snapshot, format, config.chain.corpus_settings()?)?;

		Ok(Self {
			store,
			order: config.chain.order,
			generation: config.chain.generation_input()?,
			snapshot,
			format,
			default_author: config.default_author()?,
		})
	}

	pub fn save(&self) -> Result<()> {
		self.store.save(&self.snapshot, self.format)
	}
}

#[derive(Serialize, Deserialize)]
struct IngestBody {
	author: String,
	text: String,
}

/// Query parameters of `/v1/generate`.
#[derive(Deserialize)]
struct GenerateParams {
	author: Option<String>,
	requester: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AuthorSummary {
	author: String,
	entries: usize,
}

/// Whose dataset to use: the named author, else the requester, else the
/// configured default identity. `Ok(None)` means the default dataset.
///
/// The first parameter present decides; a blank one is an error rather than
/// a reason to try the next.
fn resolve_author(params: &GenerateParams, default_author: Option<&AuthorId>) -> Result<Option<AuthorId>> {
	match params.author.as_deref().or(params.requester.as_deref()) {
		Some(id) => AuthorId::new(id).map(Some),
		None => Ok(default_author.cloned()),
	}
}

/// HTTP POST endpoint `/v1/messages`
///
/// Stores one message for its author.
#[post("/v1/messages")]
async fn post_message(data: web::Data<AppState>, body: web::Json<IngestBody>) -> impl Responder {
	let author = match AuthorId::new(body.author.as_str()) {
		Ok(author) => author,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};

	data.store.add(&author, &body.text);
	HttpResponse::NoContent().finish()
}

/// HTTP GET endpoint `/v1/generate`
///
/// Builds a chain from the resolved dataset and returns one generated line.
/// The dataset is copied out of the store first; the build and the walks
/// run on the blocking pool.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<AppState>, query: web::Query<GenerateParams>) -> impl Responder {
	let dataset = match resolve_author(&query, data.default_author.as_ref()) {
		Ok(Some(author)) => data.store.get(&author),
		Ok(None) => data.store.default_dataset(),
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};
	let order = data.order;
	let generator = Generator::new(data.generation);

	let result = web::block(move || generator.build_model(order, &dataset).map(|model| generator.generate(&model))).await;

	match result {
		Ok(Ok(Ok(line))) => HttpResponse::Ok().body(line),
		Ok(Ok(Err(exhausted))) => {
			info!("Generation gave up: {exhausted}");
			HttpResponse::UnprocessableEntity().body(format!("Could not produce a short-enough line ({exhausted})"))
		}
		Ok(Err(e)) => HttpResponse::InternalServerError().body(e.to_string()),
		Err(e) => {
			error!("Generation task failed: {e}");
			HttpResponse::InternalServerError().body("Generation task failed")
		}
	}
}

/// HTTP DELETE endpoint `/v1/authors/{author}`
///
/// Erases every entry of the author and returns them.
#[delete("/v1/authors/{author}")]
async fn delete_author(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
	let author = match AuthorId::new(path.into_inner()) {
		Ok(author) => author,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};

	HttpResponse::Ok().json(data.store.remove(&author))
}

#[get("/v1/authors")]
async fn get_authors(data: web::Data<AppState>) -> impl Responder {
	let authors: Vec<AuthorSummary> = data
		.store
		.authors()
		.into_iter()
		.map(|(author, entries)| AuthorSummary { author: author.into(), entries })
		.collect();
	HttpResponse::Ok().json(authors)
}

/// HTTP PUT endpoint `/v1/save`
///
/// Rewrites the snapshot file from the current corpus.
#[put("/v1/save")]
async fn put_save(data: web::Data<AppState>) -> impl Responder {
	let state = data.clone();
	match web::block(move || state.save()).await {
		Ok(Ok(())) => HttpResponse::Ok().body("Snapshot saved"),
		Ok(Err(e)) => {
			error!("{e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
		Err(e) => {
			error!("Save task failed: {e}");
			HttpResponse::InternalServerError().body("Save task failed")
		}
	}
}

pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(post_message)
		.service(get_generated)
		.service(delete_author)
		.service(get_authors)
		.service(put_save);
}
