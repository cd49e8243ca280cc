use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Display;
use globset::GlobSet;
use serde::Deserialize;
use serde::Serialize;

use crate::PagesmithError;
use crate::PagesmithResult;
use crate::catalog::available_templates;
use crate::config::PagesmithConfig;
use crate::fields::normalize;
use crate::guard::Fingerprint;
use crate::guard::guarded_write;
use crate::inheritance::EditMode;
use crate::inheritance::Fields;
use crate::inheritance::resolve_template;
use crate::serializer::EditPayload;
use crate::serializer::EditRequest;
use crate::serializer::serialize_edit;
use crate::storage::EntryKind;
use crate::storage::FsStorage;
use crate::storage::ProjectTemplates;
use crate::storage::Storage;
use crate::storage::display_path;

/// The variant of an [`Item`], without its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
	#[display("file")]
	PlainFile,
	#[display("template")]
	TemplateFile,
	#[display("folder")]
	Folder,
	#[display("collapsed folder")]
	CollapsedFolder,
}

/// Something addressable below the projects directory. The first path
/// component names the project; the variant is decided by [`Workspace::classify`]
/// from the shape of the path alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
	/// A file edited as one block of text.
	PlainFile(PathBuf),
	/// A file edited through its template regions.
	TemplateFile(PathBuf),
	Folder(PathBuf),
	/// A folder whose content is only counted when it appears in a tree.
	CollapsedFolder(PathBuf),
}

impl Item {
	pub fn path(&self) -> &Path {
		match self {
			Self::PlainFile(path)
			| Self::TemplateFile(path)
			| Self::Folder(path)
			| Self::CollapsedFolder(path) => path,
		}
	}

	pub fn kind(&self) -> ItemKind {
		match self {
			Self::PlainFile(_) => ItemKind::PlainFile,
			Self::TemplateFile(_) => ItemKind::TemplateFile,
			Self::Folder(_) => ItemKind::Folder,
			Self::CollapsedFolder(_) => ItemKind::CollapsedFolder,
		}
	}

	pub fn is_file(&self) -> bool {
		matches!(self, Self::PlainFile(_) | Self::TemplateFile(_))
	}

	/// The project directory containing the item. Empty for the projects
	/// directory itself.
	pub fn project_dir(&self) -> PathBuf {
		self.path()
			.components()
			.next()
			.map(|component| PathBuf::from(component.as_os_str()))
			.unwrap_or_default()
	}
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
	pub name: String,
	pub path: String,
	pub kind: ItemKind,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<TreeEntry>,
	/// Number of entries inside a collapsed folder, which is not expanded.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub child_count: Option<usize>,
}

/// What the presentation layer receives for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemView {
	PlainFile {
		path: String,
		content: String,
		fingerprint: Fingerprint,
	},
	TemplateFile {
		path: String,
		parent: Option<String>,
		mode: EditMode,
		fields: Fields,
		/// Parent templates that can be selected for `extends`.
		templates: Vec<String>,
		fingerprint: Fingerprint,
	},
	Folder {
		path: String,
		collapsed: bool,
		children: Vec<TreeEntry>,
	},
}

/// Entry point for reading, creating and editing items below a projects
/// directory.
#[derive(Debug)]
pub struct Workspace<S> {
	storage: S,
	config: PagesmithConfig,
	template_matcher: GlobSet,
}

impl Workspace<FsStorage> {
	/// Open the workspace at `root`, loading `pagesmith.toml` when present.
	pub fn open(root: &Path) -> PagesmithResult<Self> {
		let config = PagesmithConfig::load_or_default(root)?;
		let storage = config.storage(root);
		Self::new(storage, config)
	}
}

impl<S> Workspace<S>
where
	S: Storage,
{
	pub fn new(storage: S, config: PagesmithConfig) -> PagesmithResult<Self> {
		let template_matcher = config.template_matcher()?;

		Ok(Self {
			storage,
			config,
			template_matcher,
		})
	}

	pub fn storage(&self) -> &S {
		&self.storage
	}

	pub fn config(&self) -> &PagesmithConfig {
		&self.config
	}

	/// Decide the item variant from the path shape. Nothing is read.
	pub fn classify(&self, path: &Path) -> PagesmithResult<Item> {
		let components = item_components(path)?;
		let path: PathBuf = components.iter().collect();

		let Some((file_name, _)) = components.split_last() else {
			return Ok(Item::Folder(path));
		};

		// The project directory counts as its own inner path.
		let inner = components.get(1..).filter(|rest| !rest.is_empty());
		let inner_top = inner.map_or(file_name, |rest| &rest[0]);
		let in_collapsed = self.is_collapsed(inner_top);

		if !in_collapsed && self.template_matcher.is_match(file_name) {
			return Ok(Item::TemplateFile(path));
		}

		if file_name.contains('.') {
			return Ok(Item::PlainFile(path));
		}

		if inner.is_some_and(|rest| rest.len() == 1) && in_collapsed {
			return Ok(Item::CollapsedFolder(path));
		}

		Ok(Item::Folder(path))
	}

	/// Read an item for display.
	#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
	pub fn render(&self, path: &Path) -> PagesmithResult<ItemView> {
		let item = self.classify(path)?;
		let display = display_path(item.path());

		match &item {
			Item::PlainFile(path) => {
				let text = self.storage.read(path)?;

				Ok(ItemView::PlainFile {
					path: display,
					fingerprint: Fingerprint::of(&text),
					content: normalize(&text),
				})
			}
			Item::TemplateFile(path) => {
				let text = self.storage.read(path)?;
				let project_dir = item.project_dir();
				let loader = ProjectTemplates::new(&self.storage, &project_dir);
				let descriptor = resolve_template(&text, &loader)?;
				let templates = available_templates(
					&self.storage,
					&project_dir,
					&self.config.template_dir,
					descriptor.parent.as_deref(),
				)?;

				Ok(ItemView::TemplateFile {
					path: display,
					parent: descriptor.parent,
					mode: descriptor.mode,
					fields: descriptor.fields,
					templates,
					fingerprint: Fingerprint::of(&text),
				})
			}
			Item::Folder(path) | Item::CollapsedFolder(path) => {
				if self.storage.entry_kind(path)?.is_none() {
					return Err(PagesmithError::NotFound { path: display });
				}

				Ok(ItemView::Folder {
					path: display,
					collapsed: matches!(item, Item::CollapsedFolder(_)),
					children: self.tree(path)?,
				})
			}
		}
	}

	/// Create an empty file or directory for the item at `path`. The containing
	/// directory must already exist.
	pub fn create(&self, path: &Path) -> PagesmithResult<Item> {
		let item = self.classify(path)?;
		let components = item_components(item.path())?;

		let Some(name) = components.last() else {
			return Err(PagesmithError::InvalidName {
				name: String::new(),
				reason: "no item name given".to_string(),
			});
		};

		if components.len() == 1 {
			check_item_name(name, "project name", "-")?;
		} else {
			check_item_name(name, "file name", "-.")?;
		}

		let parent = item.path().parent().unwrap_or_else(|| Path::new(""));
		if self.storage.entry_kind(parent)? != Some(EntryKind::Directory) {
			return Err(PagesmithError::NotFound {
				path: display_path(parent),
			});
		}

		if item.is_file() {
			self.storage.create_file(item.path())?;
		} else {
			self.storage.create_dir(item.path())?;
		}

		tracing::info!(path = %item.path().display(), kind = %item.kind(), "created");

		Ok(item)
	}

	/// Apply an edit, refusing it when the file changed since it was read.
	/// Returns the fingerprint of the saved content.
	pub fn update(&self, request: &EditRequest) -> PagesmithResult<Fingerprint> {
		let item = self.classify(&request.path)?;
		let content = self.serialize(&item, request)?;

		guarded_write(
			&self.storage,
			item.path(),
			&request.prior_fingerprint,
			&content,
		)
	}

	/// The text [`Workspace::update`] would write, without writing it.
	pub fn preview(&self, request: &EditRequest) -> PagesmithResult<String> {
		let item = self.classify(&request.path)?;
		self.serialize(&item, request)
	}

	/// Parent templates selectable for the project containing `path`.
	pub fn templates(&self, path: &Path) -> PagesmithResult<Vec<String>> {
		let item = self.classify(path)?;
		let project_dir = item.project_dir();

		if project_dir.as_os_str().is_empty() {
			return Err(PagesmithError::InvalidName {
				name: String::new(),
				reason: "templates belong to a project, name one".to_string(),
			});
		}

		available_templates(&self.storage, &project_dir, &self.config.template_dir, None)
	}

	fn serialize(&self, item: &Item, request: &EditRequest) -> PagesmithResult<String> {
		match item {
			Item::PlainFile(path) => {
				let EditPayload::Raw(content) = &request.payload else {
					return Err(PagesmithError::InvalidEdit {
						path: display_path(path),
						reason: "plain files only accept the whole content".to_string(),
					});
				};

				if request.parent_name().is_some() {
					return Err(PagesmithError::InvalidEdit {
						path: display_path(path),
						reason: "plain files cannot extend a template".to_string(),
					});
				}

				let mut content = normalize(content);
				if !content.is_empty() {
					content.push('\n');
				}

				Ok(content)
			}
			Item::TemplateFile(_) => serialize_edit(request.parent_name(), &request.payload),
			Item::Folder(path) | Item::CollapsedFolder(path) => {
				Err(PagesmithError::NotEditable {
					path: display_path(path),
				})
			}
		}
	}

	fn is_collapsed(&self, name: &str) -> bool {
		self.config.collapsed_dirs.iter().any(|dir| dir == name)
	}

	fn tree(&self, directory: &Path) -> PagesmithResult<Vec<TreeEntry>> {
		if self.storage.entry_kind(directory)? != Some(EntryKind::Directory) {
			return Ok(Vec::new());
		}

		let mut entries = Vec::new();

		for name in self.storage.list(directory)? {
			let item = self.classify(&directory.join(&name))?;
			let (children, child_count) = match &item {
				Item::Folder(path) => (self.tree(path)?, None),
				Item::CollapsedFolder(path) => (Vec::new(), Some(self.count_entries(path)?)),
				Item::PlainFile(_) | Item::TemplateFile(_) => (Vec::new(), None),
			};

			entries.push(TreeEntry {
				path: display_path(item.path()),
				kind: item.kind(),
				name,
				children,
				child_count,
			});
		}

		Ok(entries)
	}

	fn count_entries(&self, directory: &Path) -> PagesmithResult<usize> {
		if self.storage.entry_kind(directory)? == Some(EntryKind::Directory) {
			Ok(self.storage.list(directory)?.len())
		} else {
			Ok(0)
		}
	}
}

/// Check a project or item name. Names must be non-empty and may only use ASCII
/// letters, digits and the characters in `extra`.
pub fn check_item_name(name: &str, label: &str, extra: &str) -> PagesmithResult<()> {
	if name.is_empty() {
		return Err(PagesmithError::InvalidName {
			name: String::new(),
			reason: format!("no {label} given"),
		});
	}

	let allowed = name
		.chars()
		.all(|ch| ch.is_ascii_alphanumeric() || extra.contains(ch));

	if !allowed {
		let extra = extra
			.chars()
			.map(|ch| format!("`{ch}`"))
			.collect::<Vec<_>>()
			.join(", ");

		return Err(PagesmithError::InvalidName {
			name: name.to_string(),
			reason: format!(
				"the {label} may only contain ASCII letters, digits and {extra}"
			),
		});
	}

	if !name.chars().any(|ch| ch.is_ascii_alphanumeric()) {
		return Err(PagesmithError::InvalidName {
			name: name.to_string(),
			reason: format!("the {label} needs at least one letter or digit"),
		});
	}

	Ok(())
}

fn item_components(path: &Path) -> PagesmithResult<Vec<String>> {
	let mut components = Vec::new();

	for component in path.components() {
		match component {
			Component::Normal(part) => components.push(part.to_string_lossy().to_string()),
			Component::CurDir => {}
			Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
				return Err(PagesmithError::PathEscape {
					path: display_path(path),
				});
			}
		}
	}

	Ok(components)
}
