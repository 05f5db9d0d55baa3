//! Roster file parsing for the CSV bulk-add variant.
//!
//! A roster is a CSV file with an `email` column and an optional `admin`
//! column. Parsing is strict: any structural problem or malformed address
//! fails the whole upload with an invalid-file error, so the reconciliation
//! engine only ever sees well-formed candidates.

use classhub_core::error::AppError;

use crate::outcome::MemberCandidate;
use crate::validation::validate_email;

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Strip a UTF-8 BOM from the beginning of data if present.
fn strip_utf8_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(UTF8_BOM) {
        &data[UTF8_BOM.len()..]
    } else {
        data
    }
}

/// Parse a truthy admin-column value.
fn parse_admin_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Parse a roster file into a candidate list.
///
/// Duplicate emails are left in place; the reconciliation engine owns
/// dedup semantics (first occurrence wins).
pub fn parse_roster(data: &[u8]) -> Result<Vec<MemberCandidate>, AppError> {
    let data = strip_utf8_bom(data);

    if data.is_empty() {
        return Err(AppError::invalid_file("Roster file is empty"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::invalid_file(format!("Failed to read roster headers: {e}")))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let email_idx = headers
        .iter()
        .position(|h| h == "email")
        .ok_or_else(|| AppError::invalid_file("Roster is missing the 'email' column"))?;
    let admin_idx = headers.iter().position(|h| h == "admin");

    let mut candidates = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1; first data row is line 2.
        let line_number = idx + 2;

        let record = result.map_err(|e| {
            AppError::invalid_file(format!("Failed to parse roster line {line_number}: {e}"))
        })?;

        // Skip fully empty lines.
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let email = record.get(email_idx).unwrap_or("").trim().to_string();
        validate_email(&email).map_err(|e| {
            AppError::invalid_file(format!("Roster line {line_number}: {}", e.message))
        })?;

        let admin = admin_idx
            .and_then(|i| record.get(i))
            .is_some_and(parse_admin_flag);

        candidates.push(MemberCandidate { email, admin });
    }

    if candidates.is_empty() {
        return Err(AppError::invalid_file("Roster contains no data rows"));
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use classhub_core::error::ErrorKind;

    #[test]
    fn test_parse_roster_valid() {
        let csv = b"email,admin\nkid@north.edu,true\nother@north.edu,false";
        let candidates = parse_roster(csv).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].email, "kid@north.edu");
        assert!(candidates[0].admin);
        assert!(!candidates[1].admin);
    }

    #[test]
    fn test_parse_roster_admin_column_optional() {
        let csv = b"email\nkid@north.edu";
        let candidates = parse_roster(csv).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(!candidates[0].admin);
    }

    #[test]
    fn test_parse_roster_truthy_admin_values() {
        let csv = b"email,admin\na@x.edu,1\nb@x.edu,YES\nc@x.edu,no";
        let candidates = parse_roster(csv).unwrap();
        assert!(candidates[0].admin);
        assert!(candidates[1].admin);
        assert!(!candidates[2].admin);
    }

    #[test]
    fn test_parse_roster_missing_email_column() {
        let csv = b"name,admin\nSomeone,true";
        let err = parse_roster(csv).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFile);
    }

    #[test]
    fn test_parse_roster_invalid_email_names_line() {
        let csv = b"email\nkid@north.edu\nnot-an-email";
        let err = parse_roster(csv).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFile);
        assert!(err.message.contains("line 3"));
    }

    #[test]
    fn test_parse_roster_empty_file() {
        let err = parse_roster(b"").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFile);
    }

    #[test]
    fn test_parse_roster_header_only() {
        let err = parse_roster(b"email,admin").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFile);
    }

    #[test]
    fn test_parse_roster_strips_bom() {
        let mut csv = vec![0xEF, 0xBB, 0xBF];
        csv.extend_from_slice(b"email\nkid@north.edu");
        let candidates = parse_roster(&csv).unwrap();
        assert_eq!(candidates[0].email, "kid@north.edu");
    }

    #[test]
    fn test_parse_roster_keeps_duplicates() {
        let csv = b"email,admin\nkid@north.edu,true\nkid@north.edu,false";
        let candidates = parse_roster(csv).unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_parse_roster_mixed_line_endings() {
        let csv = b"email\r\na@x.edu\nb@x.edu\r\n";
        let candidates = parse_roster(csv).unwrap();
        assert_eq!(candidates.len(), 2);
    }
}
