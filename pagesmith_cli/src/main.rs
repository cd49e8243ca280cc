use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use pagesmith_cli::Commands;
use pagesmith_cli::OutputFormat;
use pagesmith_cli::PagesmithCli;
use pagesmith_core::AnyEmptyResult;
use pagesmith_core::AnyError;
use pagesmith_core::EditPayload;
use pagesmith_core::EditRequest;
use pagesmith_core::Field;
use pagesmith_core::Fingerprint;
use pagesmith_core::FsStorage;
use pagesmith_core::Item;
use pagesmith_core::ItemKind;
use pagesmith_core::ItemView;
use pagesmith_core::PagesmithConfig;
use pagesmith_core::PagesmithError;
use pagesmith_core::Storage;
use pagesmith_core::TreeEntry;
use pagesmith_core::Workspace;
use pagesmith_core::display_path;
use pagesmith_core::scan;
use serde::Serialize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "PAGESMITH_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = PagesmithCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Show { item, format }) => run_show(&args, item, *format),
		Some(Commands::Edit {
			item,
			fingerprint,
			template,
			content,
			content_file,
			field,
			dry_run,
		}) => {
			let payload: Result<EditPayload, AnyError> = match (content, content_file) {
				(Some(content), _) => Ok(EditPayload::Raw(content.clone())),
				(None, Some(file)) => {
					std::fs::read_to_string(file)
						.map(EditPayload::Raw)
						.map_err(Into::into)
				}
				(None, None) => Ok(EditPayload::Structured(field.clone())),
			};

			payload.and_then(|payload| {
				run_edit(
					&args,
					item,
					fingerprint,
					template.as_deref(),
					payload,
					*dry_run,
				)
			})
		}
		Some(Commands::Create { item }) => run_create(&args, item),
		Some(Commands::Templates { item, format }) => run_templates(&args, item, *format),
		None => {
			eprintln!("No subcommand specified. Run `pagesmith --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<PagesmithError>() {
			Ok(error) => {
				let code = if matches!(*error, PagesmithError::Conflict { .. }) {
					3
				} else {
					2
				};
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
				process::exit(code);
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &PagesmithCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn open_workspace(args: &PagesmithCli) -> Result<Workspace<FsStorage>, PagesmithError> {
	Workspace::open(&resolve_root(args))
}

fn print_section(title: &str) {
	println!();
	println!("{}", colored!(title, bold));
}

fn print_field(label: &str, value: impl std::fmt::Display) {
	println!("{label:<14} {value}");
}

fn run_init(args: &PagesmithCli) -> AnyEmptyResult {
	let root = resolve_root(args);

	if let Some(existing) = PagesmithConfig::resolve_path(&root) {
		println!(
			"Config file already exists: {}",
			make_relative(&existing, &root)
		);
	} else {
		let sample_config = "# pagesmith configuration\n\n# Directory holding one folder per \
		                     project.\n# projects_dir = \"projects\"\n\n# Folder inside each \
		                     project with the parent templates pages can extend.\n# template_dir \
		                     = \"templates\"\n\n# Top-level project folders shown collapsed. Files \
		                     inside them are edited as plain text.\n# collapsed_dirs = \
		                     [\"static\", \"templates\"]\n\n# File names edited through their \
		                     template regions.\n# template_patterns = [\"*.html\"]\n\n# Largest \
		                     file, in bytes, that will be read.\n# max_file_size = 10485760\n";

		std::fs::write(root.join("pagesmith.toml"), sample_config)?;
		println!("Created pagesmith.toml");
	}

	let config = PagesmithConfig::load_or_default(&root)?;
	let projects_dir = root.join(&config.projects_dir);

	if projects_dir.is_dir() {
		println!(
			"Projects directory already exists: {}",
			make_relative(&projects_dir, &root)
		);
	} else {
		std::fs::create_dir_all(&projects_dir)?;
		println!(
			"Created projects directory: {}",
			make_relative(&projects_dir, &root)
		);
		println!();
		println!("Next steps:");
		println!("  1. Run `pagesmith create <project>` to add a project");
		println!("  2. Add pages and a `templates/` folder with parent templates");
		println!("  3. Run `pagesmith show <project>/<page>.html` to see the editable fields");
	}

	Ok(())
}

fn run_show(args: &PagesmithCli, item: &Path, format: OutputFormat) -> AnyEmptyResult {
	let workspace = open_workspace(args)?;
	let view = workspace.render(item)?;

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
		OutputFormat::Text => print_view(&view),
	}

	Ok(())
}

fn print_view(view: &ItemView) {
	match view {
		ItemView::PlainFile {
			path,
			content,
			fingerprint,
		} => {
			println!("{} (file)", colored!(path, bold));
			print_field("fingerprint:", fingerprint);
			print_section("Content");
			if content.is_empty() {
				println!("  (empty)");
			} else {
				print_indented(content);
			}
		}
		ItemView::TemplateFile {
			path,
			parent,
			mode,
			fields,
			templates,
			fingerprint,
		} => {
			println!("{} (template)", colored!(path, bold));
			print_field("extends:", parent.as_deref().unwrap_or("(none)"));
			print_field("mode:", mode);
			print_field("fingerprint:", fingerprint);

			for field in fields.iter() {
				print_template_field(field);
			}

			print_section("Available templates");
			if templates.is_empty() {
				println!("  (none)");
			}
			for template in templates {
				println!("  {template}");
			}
		}
		ItemView::Folder {
			path,
			collapsed,
			children,
		} => {
			let label = if *collapsed { "collapsed folder" } else { "folder" };
			let path = if path.is_empty() { "." } else { path.as_str() };
			println!("{} ({label})", colored!(path, bold));

			if children.is_empty() {
				println!("  (empty)");
			}
			print_tree(children, 1);
		}
	}
}

fn print_template_field(field: &Field) {
	let status = if field.active {
		colored!("defined", green)
	} else {
		colored!("inherited", yellow)
	};
	print_section(&format!("[{}] {status}", field.name));

	if field.active {
		if field.value.is_empty() {
			println!("  (empty)");
		} else {
			print_indented(&field.value);
		}
	}

	if !field.placeholder.is_empty() {
		println!("  placeholder:");
		for line in field.placeholder.lines() {
			println!("    {line}");
		}
	}
}

fn print_indented(content: &str) {
	for line in content.lines() {
		println!("  {line}");
	}
}

fn print_tree(entries: &[TreeEntry], depth: usize) {
	let indent = "  ".repeat(depth);

	for entry in entries {
		match entry.child_count {
			Some(count) => {
				let plural = if count == 1 { "entry" } else { "entries" };
				println!("{indent}{}/ ({count} {plural})", entry.name);
			}
			None if matches!(entry.kind, ItemKind::Folder | ItemKind::CollapsedFolder) => {
				println!("{indent}{}/", entry.name);
				print_tree(&entry.children, depth + 1);
			}
			None => println!("{indent}{} ({})", entry.name, entry.kind),
		}
	}
}

fn run_edit(
	args: &PagesmithCli,
	item: &Path,
	fingerprint: &str,
	template: Option<&str>,
	payload: EditPayload,
	dry_run: bool,
) -> AnyEmptyResult {
	let workspace = open_workspace(args)?;
	let classified = workspace.classify(item)?;
	let current = if classified.is_file() {
		match workspace.storage().read(classified.path()) {
			Ok(text) => Some(text),
			Err(PagesmithError::NotFound { .. }) => None,
			Err(error) => return Err(error.into()),
		}
	} else {
		None
	};

	// Without `--template` a template keeps extending its current parent.
	let parent = match (template, &classified, &current) {
		(Some(template), ..) => Some(template.to_string()),
		(None, Item::TemplateFile(_), Some(text)) => scan(text)?.parent,
		(None, ..) => None,
	};

	let request = EditRequest {
		path: classified.path().to_path_buf(),
		prior_fingerprint: Fingerprint::new(fingerprint),
		parent,
		payload,
	};
	let display = display_path(classified.path());

	if dry_run {
		let current = current.unwrap_or_default();
		let updated = workspace.preview(&request)?;

		if Fingerprint::of(&current) != request.prior_fingerprint {
			eprintln!(
				"{} {display} changed since the given fingerprint; saving would fail",
				colored!("warning:", yellow)
			);
		}

		if current == updated {
			println!("No changes to {display}.");
		} else {
			println!("Would update {display}:");
			print_diff(&current, &updated);
		}

		return Ok(());
	}

	let saved = workspace.update(&request)?;
	println!("{} {display}", colored!("Saved", green));
	print_field("fingerprint:", saved);

	Ok(())
}

fn run_create(args: &PagesmithCli, item: &Path) -> AnyEmptyResult {
	let workspace = open_workspace(args)?;
	let created = workspace.create(item)?;

	println!(
		"{} {} {}",
		colored!("Created", green),
		created.kind(),
		display_path(created.path())
	);

	Ok(())
}

#[derive(Serialize)]
struct TemplateList {
	project: String,
	templates: Vec<String>,
}

fn run_templates(args: &PagesmithCli, item: &Path, format: OutputFormat) -> AnyEmptyResult {
	let workspace = open_workspace(args)?;
	let templates = workspace.templates(item)?;
	let project = display_path(&workspace.classify(item)?.project_dir());

	match format {
		OutputFormat::Json => {
			let list = TemplateList { project, templates };
			println!("{}", serde_json::to_string_pretty(&list)?);
		}
		OutputFormat::Text => {
			if templates.is_empty() {
				println!(
					"No templates found in {project}/{}",
					workspace.config().template_dir
				);
			}
			for template in templates {
				println!("{template}");
			}
		}
	}

	Ok(())
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				print!("   {change}");
			}
		}
		if change.missing_newline() {
			println!();
		}
	}
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
