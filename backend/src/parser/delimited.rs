//! Delimited text (CSV/TSV) reading with encoding and delimiter auto-detection.

use super::header_names;
use crate::error::{SheetError, SheetResult};
use crate::models::{CellValue, Dataset};

/// Encoding label for raw bytes, as understood by [`decode_content`].
///
/// chardet reports plain ASCII, and gives no guess for empty input; both are
/// read as UTF-8. Latin-1 guesses are mapped to `iso-8859-1`, which is
/// decoded as ISO-8859-15 so the euro sign survives.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _confidence, _language) = chardet::detect(bytes);

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with an encoding label from [`detect_encoding`].
///
/// UTF-8 that does not decode cleanly is re-read as Windows-1252, the usual
/// encoding of spreadsheet CSV exports. Unknown labels are an error.
pub fn decode_content(bytes: &[u8], encoding: &str) -> SheetResult<String> {
    let decoded = match encoding {
        "utf-8" => {
            let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
            if had_errors {
                // Spreadsheet CSV exports are usually cp1252 when not UTF-8
                encoding_rs::WINDOWS_1252.decode(bytes).0
            } else {
                text
            }
        }
        "iso-8859-1" => encoding_rs::ISO_8859_15.decode(bytes).0,
        "windows-1252" => encoding_rs::WINDOWS_1252.decode(bytes).0,
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0,
            None => return Err(SheetError::Encoding(other.to_string())),
        },
    };

    // Strip a leading BOM so it does not end up in the first header
    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Separator used by the header line.
///
/// The candidate occurring most often in the first line wins; on a tie the
/// earlier candidate in `; , TAB |` wins, so Dutch `;` exports are preferred.
/// A header with no candidate at all is a single column, read with `,`.
pub fn detect_delimiter(content: &str) -> char {
    let header = content.lines().next().unwrap_or("");

    let mut best = (',', 0);
    for sep in [';', ',', '\t', '|'] {
        let count = header.matches(sep).count();
        if count > best.1 {
            best = (sep, count);
        }
    }
    best.0
}

/// Parse delimited text into a dataset, typing each cell.
pub fn parse_delimited(content: &str, delimiter: char) -> SheetResult<Dataset> {
    if content.trim().is_empty() {
        return Err(SheetError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header: Vec<CellValue> = reader
        .headers()?
        .iter()
        .map(|h| parse_cell(h, delimiter))
        .collect();
    let columns = header_names(&header);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<CellValue> = record.iter().map(|v| parse_cell(v, delimiter)).collect();
        if row.iter().all(CellValue::is_null) {
            continue;
        }
        rows.push(row);
    }

    Ok(Dataset::new(columns, rows))
}

/// Type a raw text cell: empty is null, then integer, then float, else text.
///
/// With a non-comma delimiter a single decimal comma is accepted (`12,5`).
pub fn parse_cell(raw: &str, delimiter: char) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }
    if let Some(f) = parse_float(trimmed, delimiter) {
        return CellValue::Float(f);
    }
    CellValue::Text(raw.to_string())
}

fn parse_float(s: &str, delimiter: char) -> Option<f64> {
    let looks_numeric = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+' | 'e' | 'E'));
    if !looks_numeric || !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(f) = s.parse::<f64>() {
        return Some(f);
    }
    if delimiter != ',' && s.matches(',').count() == 1 && !s.contains('.') {
        return s.replace(',', ".").parse::<f64>().ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let csv = "Hoeveelheid;Meeteenheid;ID Klant\n10;m3;A1\n2,5;m2;1001";
        let ds = parse_delimited(csv, ';').unwrap();

        assert_eq!(ds.columns(), ["Hoeveelheid", "Meeteenheid", "ID Klant"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.get(0, "Hoeveelheid"), Some(&CellValue::Int(10)));
        assert_eq!(ds.get(1, "Hoeveelheid"), Some(&CellValue::Float(2.5)));
        assert_eq!(ds.get(1, "ID Klant"), Some(&CellValue::Int(1001)));
        assert_eq!(ds.get(0, "Meeteenheid"), Some(&CellValue::Text("m3".into())));
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name,value\n\"Alice\",\"Hello, World\"";
        let ds = parse_delimited(csv, ',').unwrap();

        assert_eq!(ds.get(0, "name"), Some(&CellValue::Text("Alice".into())));
        assert_eq!(ds.get(0, "value"), Some(&CellValue::Text("Hello, World".into())));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "a;b\n1;2\n;\n3;4\n";
        let ds = parse_delimited(csv, ';').unwrap();

        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_missing_values_are_null() {
        let csv = "a;b;c\n1;;3\n4";
        let ds = parse_delimited(csv, ';').unwrap();

        assert_eq!(ds.get(0, "b"), Some(&CellValue::Null));
        assert_eq!(ds.get(1, "c"), Some(&CellValue::Null));
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_delimited("", ';'), Err(SheetError::EmptyFile)));
    }

    #[test]
    fn test_parse_cell_keeps_codes_as_text() {
        assert_eq!(parse_cell("m3", ';'), CellValue::Text("m3".into()));
        assert_eq!(parse_cell("e", ';'), CellValue::Text("e".into()));
        assert_eq!(parse_cell("-", ';'), CellValue::Text("-".into()));
        assert_eq!(parse_cell("1,2,3", ';'), CellValue::Text("1,2,3".into()));
        assert_eq!(parse_cell("0", ';'), CellValue::Int(0));
        assert_eq!(parse_cell("0.0", ','), CellValue::Float(0.0));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_delimiter_ties_and_single_column() {
        assert_eq!(detect_delimiter("Omschrijving;Prijs, excl."), ';');
        assert_eq!(detect_delimiter("Hoeveelheid\n3"), ',');
        assert_eq!(detect_delimiter(""), ',');
    }

    #[test]
    fn test_ascii_input_detected_as_utf8() {
        assert_eq!(detect_encoding(b"Hoeveelheid;Hours"), "utf-8");
    }

    #[test]
    fn test_latin1_decoding() {
        // "métré" in ISO-8859-1
        let bytes: &[u8] = &[0x6D, 0xE9, 0x74, 0x72, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "métré");
    }

    #[test]
    fn test_unknown_encoding_label_is_an_error() {
        let err = decode_content(b"abc", "klingon-8").unwrap_err();
        assert!(matches!(err, SheetError::Encoding(_)));
    }

    #[test]
    fn test_bom_is_stripped() {
        let decoded = decode_content("\u{feff}Hoeveelheid".as_bytes(), "utf-8").unwrap();
        assert_eq!(decoded, "Hoeveelheid");
    }
}
