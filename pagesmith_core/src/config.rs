use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;

use crate::PagesmithError;
use crate::PagesmithResult;
use crate::storage::FsStorage;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["pagesmith.toml", ".pagesmith.toml"];

/// Configuration loaded from a `pagesmith.toml` file.
///
/// ```toml
/// projects_dir = "projects"
/// template_dir = "templates"
/// collapsed_dirs = ["static", "templates"]
/// template_patterns = ["*.html", "*.jinja"]
/// max_file_size = 10485760
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PagesmithConfig {
	/// Directory holding one sub-directory per project, relative to the
	/// workspace root.
	#[serde(default = "default_projects_dir")]
	pub projects_dir: PathBuf,
	/// Directory inside each project that holds the parent templates offered
	/// for `extends`.
	#[serde(default = "default_template_dir")]
	pub template_dir: String,
	/// Top-level project directories that are shown collapsed and whose files
	/// are always edited as plain files.
	#[serde(default = "default_collapsed_dirs")]
	pub collapsed_dirs: Vec<String>,
	/// Glob patterns matched against a file name to decide whether the file is
	/// an editable template.
	#[serde(default = "default_template_patterns")]
	pub template_patterns: Vec<String>,
	/// Maximum file size in bytes to read. Defaults to 10 MB.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
}

impl Default for PagesmithConfig {
	fn default() -> Self {
		Self {
			projects_dir: default_projects_dir(),
			template_dir: default_template_dir(),
			collapsed_dirs: default_collapsed_dirs(),
			template_patterns: default_template_patterns(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
		}
	}
}

fn default_projects_dir() -> PathBuf {
	PathBuf::from("projects")
}

fn default_template_dir() -> String {
	"templates".to_string()
}

fn default_collapsed_dirs() -> Vec<String> {
	vec!["static".to_string(), default_template_dir()]
}

fn default_template_patterns() -> Vec<String> {
	vec!["*.html".to_string()]
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

impl PagesmithConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is no config file.
	pub fn load(root: &Path) -> PagesmithResult<Option<PagesmithConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;

		Ok(Some(config))
	}

	/// Like [`PagesmithConfig::load`], falling back to the defaults.
	pub fn load_or_default(root: &Path) -> PagesmithResult<PagesmithConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	pub fn from_toml(content: &str) -> PagesmithResult<PagesmithConfig> {
		toml::from_str(content).map_err(|e| PagesmithError::ConfigParse(e.to_string()))
	}

	/// Storage rooted at the projects directory below `root`.
	pub fn storage(&self, root: &Path) -> FsStorage {
		FsStorage::new(root.join(&self.projects_dir)).with_max_file_size(self.max_file_size)
	}

	/// Compile [`PagesmithConfig::template_patterns`].
	pub fn template_matcher(&self) -> PagesmithResult<GlobSet> {
		let mut builder = GlobSetBuilder::new();

		for pattern in &self.template_patterns {
			let glob = Glob::new(pattern).map_err(|e| {
				PagesmithError::InvalidPattern {
					pattern: pattern.clone(),
					reason: e.to_string(),
				}
			})?;
			builder.add(glob);
		}

		builder.build().map_err(|e| {
			PagesmithError::InvalidPattern {
				pattern: self.template_patterns.join(", "),
				reason: e.to_string(),
			}
		})
	}
}
