use std::path::Path;

use derive_more::Deref;
use derive_more::Display;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::PagesmithError;
use crate::PagesmithResult;
use crate::fields::normalize;
use crate::storage::Storage;
use crate::storage::display_path;

/// Hex SHA-256 of normalized file content. Only ever compared for equality to
/// detect that a file changed between read and write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Deref, Display)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
	/// Fingerprint of `content` after normalization, so line-ending and
	/// boundary-whitespace differences never count as a change.
	pub fn of(content: &str) -> Self {
		let digest = Sha256::digest(normalize(content).as_bytes());
		Self(hex::encode(digest))
	}

	/// Wrap a fingerprint handed back by a caller.
	pub fn new(value: impl AsRef<str>) -> Self {
		Self(value.as_ref().trim().to_ascii_lowercase())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Fingerprint {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for Fingerprint {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

/// Write `content` to `path` only if the file still has the fingerprint the
/// caller read. A file that does not exist yet is written without a check.
///
/// The re-read and the write are two separate storage calls, so a writer that
/// lands between them is not detected.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn guarded_write<S>(
	storage: &S,
	path: &Path,
	prior: &Fingerprint,
	content: &str,
) -> PagesmithResult<Fingerprint>
where
	S: Storage + ?Sized,
{
	match storage.read(path) {
		Ok(current) => {
			let current = Fingerprint::of(&current);

			if current != *prior {
				tracing::warn!(
					expected = prior.as_str(),
					found = current.as_str(),
					"refusing to overwrite a file changed since it was read"
				);
				return Err(PagesmithError::Conflict {
					path: display_path(path),
				});
			}
		}
		Err(PagesmithError::NotFound { .. }) => {
			tracing::debug!("target does not exist yet, skipping fingerprint check");
		}
		Err(error) => return Err(error),
	}

	storage.write(path, content)?;
	tracing::info!(bytes = content.len(), "saved");

	Ok(Fingerprint::of(content))
}
