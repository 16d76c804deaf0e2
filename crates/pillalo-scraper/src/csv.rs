//! Minimal RFC 4180 reader for the sheet's CSV export.
//!
//! Handles quoted fields, doubled quotes, embedded newlines and CRLF line
//! endings. Implemented as a single character scan instead of pulling in a
//! CSV crate for one well-formed export.

use crate::error::ScraperError;

/// Splits `text` into rows of fields. A leading UTF-8 BOM is ignored.
///
/// # Errors
///
/// Returns [`ScraperError::Csv`] if a quoted field is never closed.
pub(crate) fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, ScraperError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut quote_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ScraperError::Csv {
            line: quote_line,
            reason: "unterminated quoted field".to_owned(),
        });
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}
