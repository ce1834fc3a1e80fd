use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::env;

use tempfile::NamedTempFile;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Writes `bytes` to `path` as a whole-file replacement.
///
/// The data goes to a uniquely named temporary file in the same directory,
/// is synced, then renamed over the destination. Each call has its own
/// temporary file, so concurrent writers never touch each other's data and
/// the destination always holds one complete version.
/// Missing parent directories are created.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
	let path = path.as_ref();
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	fs::create_dir_all(dir)?;

	// Removed on drop if anything below fails.
	let mut temp = NamedTempFile::new_in(dir)?;
	temp.write_all(bytes)?;
	temp.as_file().sync_all()?;
	temp.persist(path).map_err(|e| e.error)?;
	Ok(())
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/alice.txt"` → `"alice"`
/// - `"alice.txt"` → `"alice"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted so callers see a stable order.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn write_atomic_replaces_whole_file_and_leaves_no_temp() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("corpus.json");

		write_atomic(&path, b"first version, quite long").unwrap();
		write_atomic(&path, b"{}").unwrap();

		assert_eq!(fs::read(&path).unwrap(), b"{}");
		let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
		assert_eq!(leftovers.len(), 1);
	}

	#[test]
	fn concurrent_writes_each_land_whole() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.json");
		let versions: Vec<Vec<u8>> = (0..4u8).map(|v| vec![b'a' + v; 64 * 1024]).collect();

		std::thread::scope(|scope| {
			for version in &versions {
				let path = &path;
				scope.spawn(move || {
					for _ in 0..20 {
						write_atomic(path, version).unwrap();
					}
				});
			}
		});

		let written = fs::read(&path).unwrap();
		assert!(versions.contains(&written));
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
	}

	#[test]
	fn list_files_filters_by_extension() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("bob.txt"), "hi").unwrap();
		fs::write(dir.path().join("alice.txt"), "hi").unwrap();
		fs::write(dir.path().join("corpus.json"), "{}").unwrap();

		let files = list_files(dir.path(), "txt").unwrap();
		assert_eq!(files, vec!["alice.txt".to_owned(), "bob.txt".to_owned()]);
	}

	#[test]
	fn read_file_splits_lines() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("alice.txt");
		fs::write(&path, "hello world\r\nfoo bar\n").unwrap();

		assert_eq!(read_file(&path).unwrap(), vec!["hello world", "foo bar"]);
		assert_eq!(get_filename(&path).unwrap(), "alice");
	}
}
