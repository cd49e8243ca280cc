use logos::Logos;

use crate::tokens::Token;
use crate::tokens::TokenKind;

const DIRECTIVE_OPEN: &[u8] = b"{%";
const COMMENT_OPEN: &[u8] = b"{#";
const COMMENT_CLOSE: &[u8] = b"#}";

/// Raw tokens produced by logos for the inside of a single directive.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[regex(r"[-+]?%\}")]
	DirectiveClose,
	#[regex(r"[ \t\r\n]+")]
	Whitespace,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Name,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
}

/// Context states for the two-mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerContext {
	/// Outside any directive, collecting literal text.
	Text,
	/// Between `{%` and `%}`.
	Directive,
}

/// A forward-only token stream over template text.
///
/// Tokens are produced on demand, one `next()` at a time. Nothing is validated
/// here: an unterminated directive simply runs to the end of the input and is
/// diagnosed by the block scanner.
pub struct Lexer<'a> {
	source: &'a str,
	/// Byte offset of the next unread character.
	offset: usize,
	/// 1-indexed line of the next unread character.
	line: usize,
	context: LexerContext,
}

impl<'a> Lexer<'a> {
	pub fn new(source: &'a str) -> Self {
		Self {
			source,
			offset: 0,
			line: 1,
			context: LexerContext::Text,
		}
	}

	/// Emit a token for the next `len` bytes and advance past them.
	fn emit(&mut self, kind: TokenKind, len: usize) -> Token {
		let value = &self.source[self.offset..self.offset + len];
		let token = Token::new(self.line, kind, value);

		self.line += value.bytes().filter(|byte| *byte == b'\n').count();
		self.offset += len;

		token
	}

	fn next_text(&mut self) -> Token {
		let rest = &self.source[self.offset..];

		if rest.as_bytes().starts_with(DIRECTIVE_OPEN) {
			let marker = rest.as_bytes().get(2).copied();
			let len = if matches!(marker, Some(b'-' | b'+')) { 3 } else { 2 };
			self.context = LexerContext::Directive;
			return self.emit(TokenKind::DirectiveOpen, len);
		}

		let len = find_directive_start(rest.as_bytes());
		self.emit(TokenKind::Text, len)
	}

	fn next_in_directive(&mut self) -> Token {
		let rest = &self.source[self.offset..];
		let mut lex = RawToken::lexer(rest);

		let Some(Ok(raw)) = lex.next() else {
			// Unrecognized input: consume exactly one character.
			let len = rest.chars().next().map_or(1, char::len_utf8);
			return self.emit(TokenKind::Other, len);
		};

		let len = lex.span().end;
		let kind = match raw {
			RawToken::DirectiveClose => {
				self.context = LexerContext::Text;
				TokenKind::DirectiveClose
			}
			RawToken::Whitespace => TokenKind::Whitespace,
			RawToken::Name => TokenKind::Name,
			RawToken::DoubleQuotedString | RawToken::SingleQuotedString => TokenKind::String,
		};

		self.emit(kind, len)
	}
}

impl Iterator for Lexer<'_> {
	type Item = Token;

	fn next(&mut self) -> Option<Self::Item> {
		if self.offset >= self.source.len() {
			return None;
		}

		let token = match self.context {
			LexerContext::Text => self.next_text(),
			LexerContext::Directive => self.next_in_directive(),
		};

		Some(token)
	}
}

/// Tokenize template text. The returned stream is lazy and can only be
/// consumed once.
pub fn tokenize(source: &str) -> Lexer<'_> {
	Lexer::new(source)
}

/// Length of the literal text before the next directive opener. Comments are
/// skipped over so that a directive inside `{# ... #}` stays literal text.
fn find_directive_start(haystack: &[u8]) -> usize {
	let mut from = 0;

	loop {
		let directive = memstr(&haystack[from..], DIRECTIVE_OPEN).map(|index| from + index);
		let comment = memstr(&haystack[from..], COMMENT_OPEN).map(|index| from + index);

		match (directive, comment) {
			(Some(directive), Some(comment)) if comment < directive => {
				let body = comment + COMMENT_OPEN.len();
				let Some(close) = memstr(&haystack[body..], COMMENT_CLOSE) else {
					return haystack.len();
				};
				from = body + close + COMMENT_CLOSE.len();
			}
			(Some(directive), _) => return directive,
			(None, _) => return haystack.len(),
		}
	}
}

pub fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}
