use std::io::ErrorKind;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::PagesmithError;
use crate::PagesmithResult;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::inheritance::TemplateLoader;

/// What a path points to on storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
	File,
	Directory,
}

/// Storage collaborator. All paths are relative to the storage root.
pub trait Storage {
	/// Read a file as text. A missing file is
	/// [`PagesmithError::NotFound`].
	fn read(&self, path: &Path) -> PagesmithResult<String>;

	/// Replace a file's content.
	fn write(&self, path: &Path, content: &str) -> PagesmithResult<()>;

	/// `None` when nothing exists at `path`.
	fn entry_kind(&self, path: &Path) -> PagesmithResult<Option<EntryKind>>;

	/// Names of the entries of a directory, sorted.
	fn list(&self, path: &Path) -> PagesmithResult<Vec<String>>;

	/// Create an empty file. Fails with [`PagesmithError::AlreadyExists`] if
	/// anything exists at `path`.
	fn create_file(&self, path: &Path) -> PagesmithResult<()>;

	/// Create a directory. Fails with [`PagesmithError::AlreadyExists`] if
	/// anything exists at `path`.
	fn create_dir(&self, path: &Path) -> PagesmithResult<()>;
}

/// [`Storage`] on the local file system below a fixed root directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
	root: PathBuf,
	max_file_size: u64,
}

impl FsStorage {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
		}
	}

	#[must_use]
	pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
		self.max_file_size = max_file_size;
		self
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Join `path` onto the root, refusing anything that could leave it.
	fn resolve(&self, path: &Path) -> PagesmithResult<PathBuf> {
		let escapes = path.components().any(|component| {
			matches!(
				component,
				Component::ParentDir | Component::RootDir | Component::Prefix(_)
			)
		});

		if escapes {
			return Err(PagesmithError::PathEscape {
				path: display_path(path),
			});
		}

		Ok(self.root.join(path))
	}
}

impl Storage for FsStorage {
	#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
	fn read(&self, path: &Path) -> PagesmithResult<String> {
		let full_path = self.resolve(path)?;
		let metadata = std::fs::metadata(&full_path).map_err(|e| map_io_error(e, path))?;

		if metadata.len() > self.max_file_size {
			return Err(PagesmithError::FileTooLarge {
				path: display_path(path),
				size: metadata.len(),
				limit: self.max_file_size,
			});
		}

		let bytes = std::fs::read(&full_path).map_err(|e| map_io_error(e, path))?;

		String::from_utf8(bytes).map_err(|_| {
			PagesmithError::InvalidEncoding {
				path: display_path(path),
			}
		})
	}

	#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
	fn write(&self, path: &Path, content: &str) -> PagesmithResult<()> {
		let full_path = self.resolve(path)?;
		let temp_path = full_path.with_extension(format!(
			"tmp-{}-{}",
			std::process::id(),
			SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.map_or(0, |duration| duration.as_nanos())
		));

		if let Err(error) = std::fs::write(&temp_path, content) {
			let _ = std::fs::remove_file(&temp_path);
			return Err(map_io_error(error, path));
		}

		if let Err(error) = std::fs::rename(&temp_path, &full_path) {
			let _ = std::fs::remove_file(&temp_path);
			return Err(error.into());
		}

		Ok(())
	}

	fn entry_kind(&self, path: &Path) -> PagesmithResult<Option<EntryKind>> {
		let full_path = self.resolve(path)?;

		match std::fs::metadata(full_path) {
			Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Directory)),
			Ok(_) => Ok(Some(EntryKind::File)),
			Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
			Err(error) => Err(error.into()),
		}
	}

	fn list(&self, path: &Path) -> PagesmithResult<Vec<String>> {
		let full_path = self.resolve(path)?;
		let entries = std::fs::read_dir(full_path).map_err(|e| map_io_error(e, path))?;

		let mut names = Vec::new();
		for entry in entries {
			names.push(entry?.file_name().to_string_lossy().to_string());
		}
		names.sort();

		Ok(names)
	}

	fn create_file(&self, path: &Path) -> PagesmithResult<()> {
		let full_path = self.resolve(path)?;

		std::fs::OpenOptions::new()
			.write(true)
			.create_new(true)
			.open(full_path)
			.map_err(|e| map_io_error(e, path))?;

		Ok(())
	}

	fn create_dir(&self, path: &Path) -> PagesmithResult<()> {
		let full_path = self.resolve(path)?;
		std::fs::create_dir(full_path).map_err(|e| map_io_error(e, path))
	}
}

fn map_io_error(error: std::io::Error, path: &Path) -> PagesmithError {
	match error.kind() {
		ErrorKind::NotFound => {
			PagesmithError::NotFound {
				path: display_path(path),
			}
		}
		ErrorKind::AlreadyExists => {
			PagesmithError::AlreadyExists {
				path: display_path(path),
			}
		}
		_ => PagesmithError::Io(error),
	}
}

/// Forward-slash form of a storage path, used in messages and names.
pub fn display_path(path: &Path) -> String {
	path.to_string_lossy().replace('\\', "/")
}

/// Loads parent templates from the project that contains the child.
pub struct ProjectTemplates<'a, S: ?Sized> {
	storage: &'a S,
	project_dir: PathBuf,
}

impl<'a, S> ProjectTemplates<'a, S>
where
	S: Storage + ?Sized,
{
	pub fn new(storage: &'a S, project_dir: impl Into<PathBuf>) -> Self {
		Self {
			storage,
			project_dir: project_dir.into(),
		}
	}
}

impl<S> TemplateLoader for ProjectTemplates<'_, S>
where
	S: Storage + ?Sized,
{
	fn load_template(&self, name: &str) -> PagesmithResult<String> {
		match self.storage.read(&self.project_dir.join(name)) {
			Err(PagesmithError::NotFound { .. }) => {
				Err(PagesmithError::ParentNotFound {
					name: name.to_string(),
				})
			}
			result => result,
		}
	}
}
