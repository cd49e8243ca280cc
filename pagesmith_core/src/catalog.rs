use std::collections::BTreeSet;
use std::path::Path;

use crate::PagesmithError;
use crate::PagesmithResult;
use crate::storage::EntryKind;
use crate::storage::Storage;

/// Names of the parent templates a template in `project_dir` may extend.
///
/// Every file directly inside `<project_dir>/<template_dir>` is listed as
/// `"<template_dir>/<file>"`. The `current` parent is always included so an
/// editor can keep showing it even when the file has since been removed. The
/// list is only offered for selection; nothing here checks that the names
/// resolve.
pub fn available_templates<S>(
	storage: &S,
	project_dir: &Path,
	template_dir: &str,
	current: Option<&str>,
) -> PagesmithResult<Vec<String>>
where
	S: Storage + ?Sized,
{
	let directory = project_dir.join(template_dir);
	let mut names = BTreeSet::new();

	match storage.list(&directory) {
		Ok(entries) => {
			for entry in entries {
				if storage.entry_kind(&directory.join(&entry))? == Some(EntryKind::File) {
					names.insert(format!("{template_dir}/{entry}"));
				}
			}
		}
		Err(PagesmithError::NotFound { .. }) => {
			tracing::debug!(
				directory = %directory.display(),
				"no template directory in project"
			);
		}
		Err(error) => return Err(error),
	}

	if let Some(current) = current.filter(|current| !current.is_empty()) {
		names.insert(current.to_string());
	}

	Ok(names.into_iter().collect())
}
