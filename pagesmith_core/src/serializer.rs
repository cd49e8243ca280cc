use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::PagesmithError;
use crate::PagesmithResult;
use crate::fields::CONTENT_FIELD;
use crate::fields::normalize;
use crate::guard::Fingerprint;
use crate::scanner::contains_block;

/// The submitted content of an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditPayload {
	/// The whole file as one text.
	Raw(String),
	/// Field name → content, in the order the fields were presented.
	Structured(Vec<(String, String)>),
}

/// A submitted edit of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
	/// Path of the file relative to the projects directory.
	pub path: PathBuf,
	/// Fingerprint handed out when the file was read.
	pub prior_fingerprint: Fingerprint,
	/// Parent template to extend. `None` and `Some("")` both mean no parent.
	pub parent: Option<String>,
	pub payload: EditPayload,
}

impl EditRequest {
	/// The parent template name, if a non-empty one is set.
	pub fn parent_name(&self) -> Option<&str> {
		self.parent.as_deref().filter(|parent| !parent.is_empty())
	}
}

/// Rebuild template source from an edit. This only constructs text; nothing
/// is written.
///
/// Structured payloads emit one region per field with non-empty content, so
/// clearing a field removes its region. A repeated field name keeps its first
/// position and takes the last submitted value. Raw payloads are written as given,
/// except that text without any region under a parent is wrapped in a
/// [`CONTENT_FIELD`] region so it overrides the parent's placeholder.
pub fn serialize_edit(parent: Option<&str>, payload: &EditPayload) -> PagesmithResult<String> {
	let parent = parent.filter(|parent| !parent.is_empty());
	let mut output = String::new();

	if let Some(parent) = parent {
		output.push_str("{% extends \"");
		output.push_str(&escape_string(parent));
		output.push_str("\" %}\n");
	}

	match payload {
		EditPayload::Structured(fields) => {
			for (name, content) in merge_repeated(fields) {
				let content = normalize(content);

				if content.is_empty() {
					continue;
				}

				check_field_name(name)?;
				push_region(&mut output, name, &content);
			}
		}
		EditPayload::Raw(content) => {
			let content = normalize(content);

			if content.is_empty() {
				return Ok(output);
			}

			if parent.is_some() && !contains_block(&content) {
				push_region(&mut output, CONTENT_FIELD, &content);
			} else {
				output.push_str(&content);
				output.push('\n');
			}
		}
	}

	Ok(output)
}

fn merge_repeated(fields: &[(String, String)]) -> Vec<(&str, &str)> {
	let mut merged: Vec<(&str, &str)> = Vec::with_capacity(fields.len());

	for (name, content) in fields {
		match merged.iter_mut().find(|(existing, _)| *existing == name.as_str()) {
			Some(entry) => entry.1 = content,
			None => merged.push((name, content)),
		}
	}

	merged
}

fn push_region(output: &mut String, name: &str, content: &str) {
	output.push_str("\n{% block ");
	output.push_str(name);
	output.push_str(" %}\n");
	output.push_str(content);
	output.push_str("\n{% endblock %}\n");
}

/// Region names must be plain identifiers for the output to scan back.
fn check_field_name(name: &str) -> PagesmithResult<()> {
	let mut chars = name.chars();
	let valid = chars
		.next()
		.is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
		&& chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');

	if valid {
		Ok(())
	} else {
		Err(PagesmithError::InvalidName {
			name: name.to_string(),
			reason: "field names may only contain ASCII letters, digits and `_`, and must not \
			         start with a digit"
				.to_string(),
		})
	}
}

fn escape_string(value: &str) -> String {
	value.replace('\\', "\\\\").replace('"', "\\\"")
}
