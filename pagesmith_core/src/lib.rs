//! `pagesmith_core` finds the named, overridable regions of Jinja-style
//! templates, resolves them against the parent template they extend, and writes
//! edits back as valid template source without losing concurrent changes.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template file
//!   → Lexer (delimiter-aware tokens: text, `{%`, `%}`, names, strings)
//!   → Scanner (top-level `block` regions, nested markup kept verbatim, `extends`)
//!   → Field extraction (region name → normalized content)
//!   → Inheritance (parent regions become placeholders, child regions are active)
//!
//! Edit submission
//!   → Serializer (fields or raw text → template source)
//!   → Guarded write (fingerprint re-check, then replace the file)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `pagesmith.toml`.
//! - [`storage`]: The [`Storage`] collaborator and its file system
//!   implementation.
//! - [`workspace`]: Item classification and the `render`/`create`/`update`
//!   operations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use pagesmith_core::EditPayload;
//! use pagesmith_core::EditRequest;
//! use pagesmith_core::ItemView;
//! use pagesmith_core::Workspace;
//!
//! let workspace = Workspace::open(Path::new(".")).unwrap();
//! let ItemView::TemplateFile { fingerprint, .. } =
//! 	workspace.render(Path::new("site/index.html")).unwrap()
//! else {
//! 	panic!("not a template");
//! };
//!
//! let request = EditRequest {
//! 	path: "site/index.html".into(),
//! 	prior_fingerprint: fingerprint,
//! 	parent: Some("templates/base.html".into()),
//! 	payload: EditPayload::Structured(vec![("title".into(), "Home".into())]),
//! };
//! workspace.update(&request).unwrap();
//! ```

pub use catalog::*;
pub use config::*;
pub use error::*;
pub use fields::*;
pub use guard::*;
pub use inheritance::*;
pub use lexer::Lexer;
pub use lexer::tokenize;
pub use scanner::*;
pub use serializer::*;
pub use storage::*;
pub use tokens::*;
pub use workspace::*;

mod catalog;
pub mod config;
#[allow(unused_assignments)]
mod error;
mod fields;
mod guard;
mod inheritance;
pub(crate) mod lexer;
mod scanner;
mod serializer;
pub mod storage;
mod tokens;
pub mod workspace;

#[cfg(test)]
mod __fixtures;
