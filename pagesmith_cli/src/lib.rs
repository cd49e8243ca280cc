use std::path::PathBuf;

use clap::ArgGroup;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Edit the named regions of page templates without touching their markup.",
	long_about = "pagesmith reads Jinja-style page templates, shows the `block` regions they \
	              define or inherit from their parent template, and writes edits back as valid \
	              template source.\n\nEvery read prints a fingerprint of the file. Edits must \
	              pass it back, and are refused when the file changed in the meantime.\n\nQuick \
	              start:\n  pagesmith init                      Create pagesmith.toml\n  \
	              pagesmith create site               Create a project\n  pagesmith show \
	              site/index.html      Show the editable fields\n  pagesmith edit \
	              site/index.html ...  Save new field values"
)]
pub struct PagesmithCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the workspace root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize a workspace by writing `pagesmith.toml` and creating the
	/// projects directory.
	///
	/// Existing files are left untouched.
	Init,
	/// Show an item: the fields of a template, the content of a plain file, or
	/// the tree below a folder.
	///
	/// Item paths are relative to the projects directory and start with the
	/// project name, e.g. `site/index.html`.
	Show {
		/// Item path, e.g. `site/index.html`.
		item: PathBuf,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Save new content for a file.
	///
	/// Pass the fingerprint printed by `show`. When the file changed since
	/// then the edit is refused with exit code 3; run `show` again and retry.
	///
	/// Fields given with `--field` replace the template's regions; a field
	/// left empty removes its region. `--content` and `--content-file` replace
	/// the whole file instead.
	#[command(group(
		ArgGroup::new("payload")
			.required(true)
			.args(["content", "content_file", "field"])
	))]
	Edit {
		/// Item path, e.g. `site/index.html`.
		item: PathBuf,

		/// Fingerprint of the content the edit is based on.
		#[arg(long)]
		fingerprint: String,

		/// Parent template to extend, relative to the project directory. Pass
		/// an empty string to stop extending a template.
		#[arg(long)]
		template: Option<String>,

		/// The complete new content.
		#[arg(long)]
		content: Option<String>,

		/// Read the complete new content from a file.
		#[arg(long)]
		content_file: Option<PathBuf>,

		/// A field value as `NAME=VALUE`. Repeat for every field in the order
		/// they should appear.
		#[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
		field: Vec<(String, String)>,

		/// Show the change as a diff without writing the file.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Create an empty file, folder or project.
	///
	/// A path with a single component creates a project. Names may only use
	/// ASCII letters, digits, `-` and (below a project) `.`.
	Create {
		/// Item path, e.g. `site/about.html`.
		item: PathBuf,
	},
	/// List the parent templates available to the project containing an item.
	Templates {
		/// Item path, e.g. `site/index.html` or just `site`.
		item: PathBuf,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}

/// Parse a `NAME=VALUE` pair. Only the first `=` separates name and value.
pub fn parse_field(value: &str) -> Result<(String, String), String> {
	let Some((name, content)) = value.split_once('=') else {
		return Err(format!("expected `NAME=VALUE`, found `{value}`"));
	};

	let name = name.trim();
	if name.is_empty() {
		return Err("the field name is empty".to_string());
	}

	Ok((name.to_string(), content.to_string()))
}
