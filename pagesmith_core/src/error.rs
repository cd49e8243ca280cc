use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum PagesmithError {
	#[error(transparent)]
	#[diagnostic(code(pagesmith::io_error))]
	Io(#[from] std::io::Error),

	#[error("not found: `{path}`")]
	#[diagnostic(
		code(pagesmith::not_found),
		help("create the item first with `pagesmith create`")
	)]
	NotFound { path: String },

	#[error("parent template not found: `{name}`")]
	#[diagnostic(
		code(pagesmith::parent_not_found),
		help("parent template names are relative to the project directory, e.g. `templates/base.html`")
	)]
	ParentNotFound { name: String },

	#[error("missing `endblock` for block `{name}` opened on line {line}")]
	#[diagnostic(
		code(pagesmith::unclosed_block),
		help("add `{{% endblock %}}` to close this block")
	)]
	UnclosedBlock { name: String, line: usize },

	#[error("directive opened on line {line} is never closed")]
	#[diagnostic(code(pagesmith::unclosed_directive), help("close the directive with `%}}`"))]
	UnclosedDirective { line: usize },

	#[error("`block` directive on line {line} has no name")]
	#[diagnostic(
		code(pagesmith::missing_block_name),
		help("name the block, e.g. `{{% block content %}}`")
	)]
	MissingBlockName { line: usize },

	#[error("`endblock {found}` on line {line} closes block `{expected}`")]
	#[diagnostic(code(pagesmith::mismatched_endblock))]
	MismatchedEndBlock {
		expected: String,
		found: String,
		line: usize,
	},

	#[error("block `{name}` on line {line} is defined twice")]
	#[diagnostic(
		code(pagesmith::duplicate_block),
		help("each top-level block name must be unique within a template")
	)]
	DuplicateBlock { name: String, line: usize },

	#[error("`{path}` was changed on disk since it was read")]
	#[diagnostic(
		code(pagesmith::conflict),
		help("read the file again to get a fresh fingerprint, then re-apply the edit")
	)]
	Conflict { path: String },

	#[error("`{path}` is not valid UTF-8")]
	#[diagnostic(code(pagesmith::invalid_encoding))]
	InvalidEncoding { path: String },

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(pagesmith::file_too_large),
		help("increase `max_file_size` in pagesmith.toml")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },

	#[error("path escapes the projects directory: `{path}`")]
	#[diagnostic(code(pagesmith::path_escape))]
	PathEscape { path: String },

	#[error("already exists: `{path}`")]
	#[diagnostic(code(pagesmith::already_exists))]
	AlreadyExists { path: String },

	#[error("`{path}` cannot be edited")]
	#[diagnostic(code(pagesmith::not_editable), help("only files can be edited"))]
	NotEditable { path: String },

	#[error("invalid name `{name}`: {reason}")]
	#[diagnostic(code(pagesmith::invalid_name))]
	InvalidName { name: String, reason: String },

	#[error("invalid edit for `{path}`: {reason}")]
	#[diagnostic(code(pagesmith::invalid_edit))]
	InvalidEdit { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(pagesmith::config_parse),
		help("check that pagesmith.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(pagesmith::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },
}

impl PagesmithError {
	/// Returns true for the errors raised while scanning template structure.
	pub fn is_parse_failure(&self) -> bool {
		matches!(
			self,
			Self::UnclosedBlock { .. }
				| Self::UnclosedDirective { .. }
				| Self::MissingBlockName { .. }
				| Self::MismatchedEndBlock { .. }
				| Self::DuplicateBlock { .. }
		)
	}
}

pub type PagesmithResult<T> = Result<T, PagesmithError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
