/// Characters that only carry formatting and are dropped outright.
const ZERO_WIDTH: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

fn is_line_terminator(c: char) -> bool {
	matches!(c, '\n' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

/// Turns raw message text into a single storable line.
///
/// - Line terminators split the text into pieces; pieces are trimmed,
///   empty ones dropped, and the rest joined with one space
/// - Zero-width formatting characters are removed
/// - Other control characters (tabs included) become a space
///
/// The result never contains a line terminator, so it can be used as one
/// training line. Empty or blank input gives an empty string.
pub fn normalize(raw: &str) -> String {
	let cleaned: String = raw
		.chars()
		.filter(|c| !ZERO_WIDTH.contains(c))
		.map(|c| if c.is_control() && !is_line_terminator(c) { ' ' } else { c })
		.collect();

	cleaned
		.split(is_line_terminator)
		.map(str::trim)
		.filter(|piece| !piece.is_empty())
		.collect::<Vec<_>>()
		.join(" ")
}
