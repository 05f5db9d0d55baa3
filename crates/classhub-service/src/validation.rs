//! Input validation helpers shared by the JSON and roster entry points.

use classhub_core::error::AppError;

use crate::outcome::MemberCandidate;

/// Maximum accepted email length (RFC 5321 path limit).
const MAX_EMAIL_LEN: usize = 254;

/// Validate the shape of an email address.
///
/// Deliberately lenient — the directory treats emails as opaque identifiers;
/// this only rejects input that can never be deliverable: empty strings,
/// whitespace, a missing `@`, or a domain part without a dot.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::validation("Email must not be empty"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(AppError::validation(format!(
            "Email exceeds {MAX_EMAIL_LEN} characters"
        )));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(AppError::validation(format!(
            "Email '{email}' contains whitespace"
        )));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::validation(format!(
            "Email '{email}' is missing an '@'"
        )));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(AppError::validation(format!(
            "Email '{email}' is not a valid address"
        )));
    }
    Ok(())
}

/// Validate a candidate batch before it reaches the reconciliation engine.
///
/// The batch must contain between 1 and `max` entries (duplicates counted
/// as given), and every email must pass [`validate_email`].
pub fn validate_candidates(candidates: &[MemberCandidate], max: usize) -> Result<(), AppError> {
    if candidates.is_empty() {
        return Err(AppError::validation("At least one member is required"));
    }
    if candidates.len() > max {
        return Err(AppError::validation(format!(
            "Batch exceeds the maximum of {max} members"
        )));
    }
    for candidate in candidates {
        validate_email(&candidate.email)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(len: usize) -> Vec<MemberCandidate> {
        (0..len)
            .map(|i| MemberCandidate {
                email: format!("user{i}@example.edu"),
                admin: false,
            })
            .collect()
    }

    #[test]
    fn test_batch_size_boundaries() {
        assert!(validate_candidates(&batch(0), 600).is_err());
        assert!(validate_candidates(&batch(1), 600).is_ok());
        assert!(validate_candidates(&batch(600), 600).is_ok());
        assert!(validate_candidates(&batch(601), 600).is_err());
    }

    #[test]
    fn test_batch_rejects_bad_email() {
        let mut candidates = batch(2);
        candidates[1].email = "broken".to_string();
        assert!(validate_candidates(&candidates, 600).is_err());
    }

    #[test]
    fn test_accepts_plain_addresses() {
        assert!(validate_email("kid@north.edu").is_ok());
        assert!(validate_email("first.last+tag@sub.example.com").is_ok());
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@north.edu").is_err());
        assert!(validate_email("kid@").is_err());
        assert!(validate_email("kid@nodot").is_err());
        assert!(validate_email("kid name@north.edu").is_err());
    }

    #[test]
    fn test_rejects_oversized_addresses() {
        let long = format!("{}@example.com", "a".repeat(300));
        assert!(validate_email(&long).is_err());
    }
}
