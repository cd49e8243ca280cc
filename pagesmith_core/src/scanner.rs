use serde::Deserialize;
use serde::Serialize;

use crate::PagesmithError;
use crate::PagesmithResult;
use crate::lexer::tokenize;
use crate::tokens::Token;
use crate::tokens::TokenKind;

const BLOCK: &str = "block";
const END_BLOCK: &str = "endblock";
const EXTENDS: &str = "extends";

/// A named `{% block NAME %} ... {% endblock %}` region.
///
/// `raw_content` is the exact text between the opening directive's `%}` and
/// the matching `{% endblock %}`. Regions nested inside it are kept verbatim
/// as part of that text; use [`Region::nested`] to address them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
	pub name: String,
	pub raw_content: String,
	/// Nesting depth of the pass that found the region, `0` at top level.
	pub depth: usize,
	/// 1-indexed line of the opening directive.
	pub line: usize,
}

impl Region {
	/// Run a second extraction pass over this region's content and return the
	/// regions directly inside it.
	pub fn nested(&self) -> PagesmithResult<Vec<Region>> {
		Ok(scan_at_depth(&self.raw_content, self.depth + 1)?.regions)
	}
}

/// The block structure of one template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedTemplate {
	/// The first string-literal `extends` target seen at top level.
	pub parent: Option<String>,
	/// Top-level regions in the order they appear.
	pub regions: Vec<Region>,
	/// Whether non-whitespace text or directives other than `block` and
	/// `extends` appear outside the top-level regions.
	pub has_outside_content: bool,
}

/// A single forward cursor over a token stream. Every scanning routine
/// receives the same cursor by `&mut`, so nested helpers advance one shared
/// position and the stream is never restarted.
pub struct TokenCursor<I> {
	tokens: I,
}

impl<I> TokenCursor<I>
where
	I: Iterator<Item = Token>,
{
	pub fn new(tokens: I) -> Self {
		Self { tokens }
	}

	fn next_token(&mut self) -> Option<Token> {
		self.tokens.next()
	}

	/// Next token that isn't whitespace. Skipped whitespace is appended to
	/// `buffer` so callers that copy text verbatim don't lose it.
	fn next_significant(&mut self, buffer: &mut String) -> Option<Token> {
		loop {
			let token = self.tokens.next()?;
			if token.kind != TokenKind::Whitespace {
				return Some(token);
			}
			buffer.push_str(&token.value);
		}
	}

	/// Consume the remainder of the current directive, up to and including its
	/// closing delimiter.
	fn skip_directive(&mut self, line: usize) -> PagesmithResult<()> {
		loop {
			match self.tokens.next() {
				Some(token) if token.kind == TokenKind::DirectiveClose => return Ok(()),
				Some(_) => {}
				None => return Err(PagesmithError::UnclosedDirective { line }),
			}
		}
	}
}

/// Scan template text for its `extends` target and top-level regions.
pub fn scan(text: &str) -> PagesmithResult<ScannedTemplate> {
	scan_at_depth(text, 0)
}

fn scan_at_depth(text: &str, depth: usize) -> PagesmithResult<ScannedTemplate> {
	let mut cursor = TokenCursor::new(tokenize(text));
	let mut scanned = ScannedTemplate::default();
	let mut scratch = String::new();

	while let Some(token) = cursor.next_token() {
		scratch.clear();

		match token.kind {
			TokenKind::DirectiveOpen => {}
			TokenKind::Text => {
				if !token.value.trim().is_empty() {
					scanned.has_outside_content = true;
				}
				continue;
			}
			_ => continue,
		}

		let line = token.line;
		let Some(keyword) = cursor.next_significant(&mut scratch) else {
			return Err(PagesmithError::UnclosedDirective { line });
		};

		if keyword.kind == TokenKind::DirectiveClose {
			continue;
		}

		if keyword.is_name(BLOCK) {
			let region = read_region(&mut cursor, line, depth)?;

			if scanned.regions.iter().any(|other| other.name == region.name) {
				return Err(PagesmithError::DuplicateBlock {
					name: region.name,
					line,
				});
			}

			scanned.regions.push(region);
			continue;
		}

		if keyword.is_name(EXTENDS) {
			let Some(target) = cursor.next_significant(&mut scratch) else {
				return Err(PagesmithError::UnclosedDirective { line });
			};

			match target.string_value() {
				Some(parent) if scanned.parent.is_none() => {
					tracing::debug!(parent = parent.as_str(), line, "found extends directive");
					scanned.parent = Some(parent);
				}
				Some(_) => {}
				None => scanned.has_outside_content = true,
			}

			if target.kind != TokenKind::DirectiveClose {
				cursor.skip_directive(line)?;
			}
			continue;
		}

		if keyword.is_name(END_BLOCK) {
			tracing::warn!(line, "ignoring `endblock` without a matching `block`");
		} else {
			scanned.has_outside_content = true;
		}

		cursor.skip_directive(line)?;
	}

	Ok(scanned)
}

/// Read a region whose `{%` and `block` keyword have already been consumed.
fn read_region<I>(cursor: &mut TokenCursor<I>, line: usize, depth: usize) -> PagesmithResult<Region>
where
	I: Iterator<Item = Token>,
{
	let mut scratch = String::new();
	let name = match cursor.next_significant(&mut scratch) {
		Some(token) if token.kind == TokenKind::Name => token.value,
		Some(token) if token.kind == TokenKind::DirectiveClose => {
			return Err(PagesmithError::MissingBlockName { line });
		}
		Some(_) => {
			cursor.skip_directive(line)?;
			return Err(PagesmithError::MissingBlockName { line });
		}
		None => return Err(PagesmithError::UnclosedDirective { line }),
	};

	// Modifiers such as `scoped` or `required` are not part of the content.
	cursor.skip_directive(line)?;

	let raw_content = read_region_body(cursor, &name, line)?;

	Ok(Region {
		name,
		raw_content,
		depth,
		line,
	})
}

/// Accumulate text until the `endblock` that brings the nesting depth back to
/// zero. Nested `block`/`endblock` directives are copied verbatim.
fn read_region_body<I>(cursor: &mut TokenCursor<I>, name: &str, line: usize) -> PagesmithResult<String>
where
	I: Iterator<Item = Token>,
{
	let mut depth = 1_usize;
	let mut content = String::new();

	loop {
		let Some(token) = cursor.next_token() else {
			return Err(PagesmithError::UnclosedBlock {
				name: name.to_string(),
				line,
			});
		};

		if token.kind != TokenKind::DirectiveOpen {
			content.push_str(&token.value);
			continue;
		}

		let directive_line = token.line;
		let mut buffer = token.value;
		let Some(keyword) = cursor.next_significant(&mut buffer) else {
			return Err(PagesmithError::UnclosedBlock {
				name: name.to_string(),
				line,
			});
		};

		if keyword.is_name(END_BLOCK) {
			depth -= 1;

			if depth == 0 {
				close_region(cursor, name, directive_line)?;
				return Ok(content);
			}
		} else if keyword.is_name(BLOCK) {
			depth += 1;
		}

		buffer.push_str(&keyword.value);
		content.push_str(&buffer);
	}
}

/// Consume the rest of a region's closing directive, checking the optional
/// name in `{% endblock NAME %}`.
fn close_region<I>(cursor: &mut TokenCursor<I>, name: &str, line: usize) -> PagesmithResult<()>
where
	I: Iterator<Item = Token>,
{
	let mut scratch = String::new();

	match cursor.next_significant(&mut scratch) {
		Some(token) if token.kind == TokenKind::DirectiveClose => Ok(()),
		Some(token) if token.kind == TokenKind::Name && token.value != name => {
			Err(PagesmithError::MismatchedEndBlock {
				expected: name.to_string(),
				found: token.value,
				line,
			})
		}
		Some(_) => cursor.skip_directive(line),
		None => Err(PagesmithError::UnclosedDirective { line }),
	}
}

/// Whether the text contains any `block` directive. Unlike [`scan`] this never
/// fails, so it can classify content that is still being edited.
pub fn contains_block(text: &str) -> bool {
	let mut cursor = TokenCursor::new(tokenize(text));
	let mut scratch = String::new();

	while let Some(token) = cursor.next_token() {
		if token.kind != TokenKind::DirectiveOpen {
			continue;
		}

		match cursor.next_significant(&mut scratch) {
			Some(keyword) if keyword.is_name(BLOCK) => return true,
			Some(_) => {}
			None => return false,
		}
	}

	false
}
