use crate::PagesmithResult;
use crate::scanner::ScannedTemplate;
use crate::scanner::scan;

/// Name of the implicit field that holds a template's whole text when it has
/// no regions of its own.
pub const CONTENT_FIELD: &str = "content";

/// Region name → normalized content, in the order the regions appear.
pub type FieldContents = Vec<(String, String)>;

/// Canonicalize line endings to `\n` and strip blank lines and spaces at the
/// start and end of the text. Interior whitespace is untouched.
pub fn normalize(content: &str) -> String {
	content
		.replace("\r\n", "\n")
		.replace('\r', "\n")
		.trim_matches(|ch| matches!(ch, '\n' | ' ' | '\t'))
		.to_string()
}

/// Extract the top-level fields of a template.
///
/// A template with neither regions nor an `extends` directive yields a single
/// implicit [`CONTENT_FIELD`] holding its whole normalized text.
pub fn extract_fields(text: &str) -> PagesmithResult<FieldContents> {
	let scanned = scan(text)?;
	Ok(fields_from_scan(&scanned, text))
}

pub(crate) fn fields_from_scan(scanned: &ScannedTemplate, text: &str) -> FieldContents {
	if scanned.regions.is_empty() && scanned.parent.is_none() {
		return vec![(CONTENT_FIELD.to_string(), normalize(text))];
	}

	scanned
		.regions
		.iter()
		.map(|region| (region.name.clone(), normalize(&region.raw_content)))
		.collect()
}
