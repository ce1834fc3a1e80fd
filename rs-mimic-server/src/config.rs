use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rs_mimic_core::{AuthorId, ChainConfig, MimicError, Result};
use serde::{Deserialize, Serialize};

/// Host configuration, read from a TOML file.
///
/// ```toml
/// [chain]
/// max_limit = 25000
/// order = 2
///
/// [storage]
/// snapshot = "./data/corpus.json"
///
/// [http]
/// host = "127.0.0.1"
/// port = 5000
///
/// [logging]
/// filter = "info"
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
	pub chain: ChainConfig,
	pub storage: StorageConfig,
	pub http: HttpConfig,
	pub logging: LoggingConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
	/// Snapshot file; a `.bin` extension selects the postcard format.
	pub snapshot: PathBuf,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self { snapshot: PathBuf::from("./data/corpus.json") }
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	pub cors: bool,
	/// Identity used by `/v1/generate` when the request names nobody.
	pub default_author: Option<String>,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			cors: false,
			default_author: None,
		}
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
	/// `env_logger` filter, overridden by `RUST_LOG`.
	pub filter: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self { filter: "info".to_owned() }
	}
}

impl ServerConfig {
	/// Reads and validates the config at `path`.
	///
	/// A missing file gives the defaults; an unreadable or invalid one is an
	/// error.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let contents = match fs::read_to_string(path) {
			Ok(contents) => contents,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(source) => return Err(MimicError::ConfigIo { path: path.to_path_buf(), source }),
		};

		let config = Self::parse(&contents).map_err(|e| match e {
			MimicError::ConfigParse { message, .. } => MimicError::ConfigParse { path: path.to_path_buf(), message },
			other => other,
		})?;
		Ok(config)
	}

	/// Parses and validates TOML text.
	pub fn parse(contents: &str) -> Result<Self> {
		let config: Self = toml::from_str(contents).map_err(|e| MimicError::ConfigParse {
			path: PathBuf::new(),
			message: e.to_string(),
		})?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		self.chain.validate()?;
		self.default_author()?;
		Ok(())
	}

	pub fn default_author(&self) -> Result<Option<AuthorId>> {
		self.http.default_author.as_deref().map(AuthorId::new).transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rs_mimic_core::DatasetPolicy;

	#[test]
	fn missing_file_gives_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = ServerConfig::load(dir.path().join("absent.toml")).unwrap();
		assert_eq!(config, ServerConfig::default());
		assert_eq!(config.chain.max_length, 200);
		assert_eq!(config.http.port, 5000);
	}

	#[test]
	fn partial_file_is_merged_with_defaults() {
		let config = ServerConfig::parse(
			r#"
			[chain]
			max_limit = 10
			dataset_policy = "keep_newest"

			[http]
			port = 8080
			default_author = "42"
			"#,
		)
		.unwrap();

		assert_eq!(config.chain.max_limit, 10);
		assert_eq!(config.chain.order, 2);
		assert_eq!(config.chain.dataset_policy, DatasetPolicy::KeepNewest);
		assert_eq!(config.http.port, 8080);
		assert_eq!(config.http.host, "127.0.0.1");
		assert_eq!(config.default_author().unwrap(), Some(AuthorId::from(42)));
	}

	#[test]
	fn invalid_values_are_fatal() {
		assert!(matches!(
			ServerConfig::parse("[chain]\nmax_tries = 0\n"),
			Err(MimicError::NonPositive { field: "max_tries" })
		));
		assert!(matches!(
			ServerConfig::parse("[http]\ndefault_author = \" \"\n"),
			Err(MimicError::EmptyAuthorId)
		));

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("mimic.toml");
		fs::write(&path, "[chain\n").unwrap();
		assert!(matches!(ServerConfig::load(&path), Err(MimicError::ConfigParse { .. })));
	}
}
