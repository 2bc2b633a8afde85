use std::fmt::{self, Write};

/// Writes `value` as a SPARQL `STRING_LITERAL2`, i.e., enclosed in double quotes with all
/// characters escaped that may not appear verbatim.
pub fn write_string_literal(f: &mut impl Write, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        match c {
            '\\' => f.write_str("\\\\"),
            '"' => f.write_str("\\\""),
            '\n' => f.write_str("\\n"),
            '\r' => f.write_str("\\r"),
            '\t' => f.write_str("\\t"),
            '\u{08}' => f.write_str("\\b"),
            '\u{0C}' => f.write_str("\\f"),
            c => f.write_char(c),
        }?;
    }
    f.write_char('"')
}

/// Returns `value` as a quoted and escaped SPARQL string literal.
pub fn string_literal(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    // Writing to a String cannot fail.
    let _ = write_string_literal(&mut result, value);
    result
}
