#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use pagesmith_core::AnyResult;
use tempfile::TempDir;

pub const BASE_TEMPLATE: &str = "<html>\n<head><title>{% block title %}Home{% endblock \
                                 %}</title></head>\n<body>\n{% block body %}<p>Welcome</p>{% \
                                 endblock %}\n</body>\n</html>\n";

pub const INDEX_TEMPLATE: &str =
	"{% extends \"templates/base.html\" %}\n\n{% block body %}\n<h1>Hi</h1>\n{% endblock %}\n";

/// `pagesmith` with colors off, pointed at `root`.
pub fn pagesmith_cmd(root: &Path) -> Command {
	let mut cmd =
		Command::cargo_bin("pagesmith").unwrap_or_else(|e| panic!("pagesmith binary: {e}"));
	cmd.env("NO_COLOR", "1")
		.env_remove("PAGESMITH_LOG")
		.arg("--path")
		.arg(root);
	cmd
}

/// A workspace with one project `site` containing a page, a plain file, a
/// stylesheet and a parent template.
pub fn site() -> AnyResult<TempDir> {
	let tmp = tempfile::tempdir()?;
	let site = tmp.path().join("projects/site");

	std::fs::create_dir_all(site.join("static"))?;
	std::fs::create_dir_all(site.join("templates"))?;
	std::fs::write(site.join("index.html"), INDEX_TEMPLATE)?;
	std::fs::write(site.join("notes.txt"), "remember the milk\n")?;
	std::fs::write(site.join("static/style.css"), "body { margin: 0; }\n")?;
	std::fs::write(site.join("templates/base.html"), BASE_TEMPLATE)?;

	Ok(tmp)
}

pub fn read(root: &Path, item: &str) -> AnyResult<String> {
	Ok(std::fs::read_to_string(root.join("projects").join(item))?)
}

/// Run `show --format json` and return the parsed output.
pub fn show_json(root: &Path, item: &str) -> AnyResult<serde_json::Value> {
	let output = pagesmith_cmd(root)
		.arg("show")
		.arg(item)
		.arg("--format")
		.arg("json")
		.output()?;
	assert!(output.status.success(), "show {item} failed: {output:?}");

	Ok(serde_json::from_slice(&output.stdout)?)
}

/// The fingerprint `show` hands out for an item.
pub fn fingerprint(root: &Path, item: &str) -> AnyResult<String> {
	let view = show_json(root, item)?;
	let fingerprint = view["fingerprint"]
		.as_str()
		.unwrap_or_else(|| panic!("no fingerprint in {view}"));

	Ok(fingerprint.to_string())
}
