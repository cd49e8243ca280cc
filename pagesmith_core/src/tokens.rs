use std::fmt::Display;

use snailquote::unescape;

/// The category of a [`Token`]. Only directive structure is tokenized;
/// everything outside `{% ... %}` is a single `Text` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
	/// Literal text outside directives, including `{# ... #}` comments.
	Text,
	/// `{%`, `{%-` or `{%+`
	DirectiveOpen,
	/// `%}`, `-%}` or `+%}`
	DirectiveClose,
	/// An identifier inside a directive, e.g. `block` or `content`.
	Name,
	/// A quoted string inside a directive, e.g. `"base.html"`.
	String,
	/// ` ` | `\t` | `\r` | `\n` runs inside a directive.
	Whitespace,
	/// Any other single character inside a directive.
	Other,
}

/// A token with the exact source slice it was produced from. Concatenating the
/// `value` of every token in a stream reproduces the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	/// 1-indexed line on which the token starts.
	pub line: usize,
	pub kind: TokenKind,
	pub value: String,
}

impl Token {
	pub fn new(line: usize, kind: TokenKind, value: impl Into<String>) -> Self {
		Self {
			line,
			kind,
			value: value.into(),
		}
	}

	/// Whether this is the identifier `name`.
	pub fn is_name(&self, name: &str) -> bool {
		self.kind == TokenKind::Name && self.value == name
	}

	/// The unquoted value of a `String` token. Returns `None` for any other kind
	/// or when the escapes are malformed.
	pub fn string_value(&self) -> Option<String> {
		if self.kind != TokenKind::String || self.value.len() < 2 {
			return None;
		}

		let inner = &self.value[1..self.value.len() - 1];

		if !inner.contains('\\') {
			return Some(inner.to_string());
		}

		// `unescape` only processes escapes inside double quotes.
		if self.value.starts_with('"') {
			unescape(&self.value).ok()
		} else {
			Some(inner.replace("\\'", "'").replace("\\\\", "\\"))
		}
	}
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.value)
	}
}
