use std::collections::HashMap;
use std::path::Path;

use rstest::fixture;
use tempfile::TempDir;

use crate::PagesmithError;
use crate::PagesmithResult;
use crate::TemplateLoader;
use crate::Workspace;
use crate::storage::FsStorage;

pub const BASE_TEMPLATE: &str = r#"<!doctype html>
<html>
<head><title>{% block title %}Home{% endblock %}</title></head>
<body>
{% block body %}
  <p>Welcome</p>
{% endblock %}
</body>
</html>
"#;

pub const CHILD_TEMPLATE: &str = r#"{% extends "templates/base.html" %}

{% block body %}
<h1>Hi</h1>
{% endblock %}
"#;

/// [`TemplateLoader`] backed by a fixed set of templates.
#[derive(Default)]
pub struct MemoryLoader {
	templates: HashMap<String, String>,
}

impl MemoryLoader {
	pub fn with(mut self, name: &str, text: &str) -> Self {
		self.templates.insert(name.to_string(), text.to_string());
		self
	}
}

impl TemplateLoader for MemoryLoader {
	fn load_template(&self, name: &str) -> PagesmithResult<String> {
		self.templates
			.get(name)
			.cloned()
			.ok_or_else(|| {
				PagesmithError::ParentNotFound {
					name: name.to_string(),
				}
			})
	}
}

#[fixture]
pub fn loader() -> MemoryLoader {
	MemoryLoader::default().with("templates/base.html", BASE_TEMPLATE)
}

/// A workspace with a single project `site`:
///
/// ```text
/// projects/site/index.html
/// projects/site/notes.txt
/// projects/site/pages/about.html
/// projects/site/static/style.css
/// projects/site/templates/base.html
/// ```
pub struct SiteWorkspace {
	pub tmp: TempDir,
	pub workspace: Workspace<FsStorage>,
}

impl SiteWorkspace {
	pub fn projects_dir(&self) -> std::path::PathBuf {
		self.tmp.path().join("projects")
	}

	pub fn write(&self, path: &str, content: &str) {
		let full_path = self.projects_dir().join(path);
		if let Some(parent) = full_path.parent() {
			std::fs::create_dir_all(parent)
				.unwrap_or_else(|e| panic!("create_dir_all {}: {e}", parent.display()));
		}
		std::fs::write(&full_path, content)
			.unwrap_or_else(|e| panic!("write {}: {e}", full_path.display()));
	}

	pub fn read(&self, path: &str) -> String {
		let full_path = self.projects_dir().join(path);
		std::fs::read_to_string(&full_path)
			.unwrap_or_else(|e| panic!("read {}: {e}", full_path.display()))
	}
}

#[fixture]
pub fn site() -> SiteWorkspace {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let workspace = open_workspace(tmp.path());
	let site = SiteWorkspace { tmp, workspace };

	site.write("site/index.html", CHILD_TEMPLATE);
	site.write("site/notes.txt", "remember the milk\r\n");
	site.write("site/pages/about.html", "<p>About us</p>\n");
	site.write("site/static/style.css", "body { margin: 0; }\n");
	site.write("site/templates/base.html", BASE_TEMPLATE);

	site
}

pub fn open_workspace(root: &Path) -> Workspace<FsStorage> {
	Workspace::open(root).unwrap_or_else(|e| panic!("open workspace: {e}"))
}
