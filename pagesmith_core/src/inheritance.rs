use derive_more::Deref;
use derive_more::Display;
use serde::Deserialize;
use serde::Serialize;

use crate::PagesmithResult;
use crate::fields::CONTENT_FIELD;
use crate::fields::extract_fields;
use crate::fields::fields_from_scan;
use crate::fields::normalize;
use crate::scanner::ScannedTemplate;
use crate::scanner::scan;

/// An editable unit shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
	pub name: String,
	/// Content of the parent template's region with the same name, shown as a
	/// hint while the field is not overridden.
	pub placeholder: String,
	/// Content of the field in the template itself.
	pub value: String,
	/// `true` when the template defines the field itself, `false` when it only
	/// exists as an inherited placeholder.
	pub active: bool,
}

/// Ordered collection of [`Field`]s with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref)]
#[serde(transparent)]
pub struct Fields(Vec<Field>);

impl Fields {
	pub fn get(&self, name: &str) -> Option<&Field> {
		self.0.iter().find(|field| field.name == name)
	}

	/// Replace the field with the same name in place, or append it.
	pub fn upsert(&mut self, field: Field) {
		match self.0.iter_mut().find(|existing| existing.name == field.name) {
			Some(existing) => *existing = field,
			None => self.0.push(field),
		}
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|field| field.name.as_str())
	}
}

impl FromIterator<Field> for Fields {
	fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
		let mut fields = Self::default();
		for field in iter {
			fields.upsert(field);
		}
		fields
	}
}

/// How a template's fields are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
	/// The whole file is a single `content` field.
	#[display("raw")]
	Raw,
	/// Each region is a separate field.
	#[display("structured")]
	Structured,
}

/// Everything the presentation layer needs to render an editor for one
/// template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
	/// Parent template named by `extends`, relative to the project directory.
	pub parent: Option<String>,
	pub mode: EditMode,
	pub fields: Fields,
}

/// Loads parent templates by the name used in `extends`.
pub trait TemplateLoader {
	/// Returns the template's text, or
	/// [`PagesmithError::ParentNotFound`](crate::PagesmithError::ParentNotFound)
	/// when no such template exists.
	fn load_template(&self, name: &str) -> PagesmithResult<String>;
}

/// Build the editable fields of a template, seeding placeholders from its
/// parent when it extends one. The parent is only read.
pub fn resolve_template(
	text: &str,
	loader: &impl TemplateLoader,
) -> PagesmithResult<TemplateDescriptor> {
	let scanned = scan(text)?;

	let Some(parent) = scanned.parent.clone() else {
		return Ok(resolve_standalone(&scanned, text));
	};

	tracing::debug!(parent = parent.as_str(), "resolving inherited fields");

	if scanned.has_outside_content {
		tracing::warn!(
			parent = parent.as_str(),
			"content outside blocks in a child template is dropped by a structured save"
		);
	}

	let parent_text = loader.load_template(&parent)?;
	let mut fields: Fields = extract_fields(&parent_text)?
		.into_iter()
		.map(|(name, placeholder)| {
			Field {
				name,
				placeholder,
				value: String::new(),
				active: false,
			}
		})
		.collect();

	for (name, value) in fields_from_scan(&scanned, text) {
		let placeholder = fields
			.get(&name)
			.map(|field| field.placeholder.clone())
			.unwrap_or_default();

		fields.upsert(Field {
			name,
			placeholder,
			value,
			active: true,
		});
	}

	Ok(TemplateDescriptor {
		parent: Some(parent),
		mode: EditMode::Structured,
		fields,
	})
}

/// A template without a parent is structured only when nothing but regions
/// appears at its top level; otherwise a structured save would lose the
/// surrounding layout, so the whole text is edited as one field.
fn resolve_standalone(scanned: &ScannedTemplate, text: &str) -> TemplateDescriptor {
	if scanned.regions.is_empty() || scanned.has_outside_content {
		return TemplateDescriptor {
			parent: None,
			mode: EditMode::Raw,
			fields: Fields(vec![Field {
				name: CONTENT_FIELD.to_string(),
				placeholder: String::new(),
				value: normalize(text),
				active: true,
			}]),
		};
	}

	let fields = fields_from_scan(scanned, text)
		.into_iter()
		.map(|(name, value)| {
			Field {
				name,
				placeholder: String::new(),
				value,
				active: true,
			}
		})
		.collect();

	TemplateDescriptor {
		parent: None,
		mode: EditMode::Structured,
		fields,
	}
}
