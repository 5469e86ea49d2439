//! Validation utilities.

use crate::types::ChatError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest accepted message body, in characters.
pub const MAX_BODY_CHARS: usize = 10_000;

// Generated ids are lower-case alphanumerics starting with a letter.
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]{1,31}$").expect("id pattern is valid"));

pub fn is_well_formed_id(value: &str) -> bool {
    ID_PATTERN.is_match(value)
}

/// Validate the id of the user a chat is requested with
pub fn participant_id(value: &str) -> Result<(), ChatError> {
    if value.trim().is_empty() {
        return Err(ChatError::invalid("participant id is required"));
    }
    if !is_well_formed_id(value) {
        return Err(ChatError::invalid("invalid participant id"));
    }
    Ok(())
}

/// Validate a message body and return the text to store, without surrounding whitespace
pub fn message_body(body: &str) -> Result<&str, ChatError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ChatError::invalid("message body cannot be empty"));
    }
    if trimmed.chars().count() > MAX_BODY_CHARS {
        return Err(ChatError::invalid(format!(
            "message body must be at most {MAX_BODY_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_well_formed() {
        let id = parley_database::new_id();
        assert!(is_well_formed_id(&id), "{id} should be accepted");
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["", "a", "1abc", "ABCdef", "abc-def", "abc def", "x".repeat(40).as_str()] {
            assert!(!is_well_formed_id(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn participant_id_messages() {
        assert!(matches!(
            participant_id("  "),
            Err(ChatError::InvalidArgument { message }) if message == "participant id is required"
        ));
        assert!(matches!(
            participant_id("not an id"),
            Err(ChatError::InvalidArgument { message }) if message == "invalid participant id"
        ));
        assert!(participant_id("ckw1x2y3z4").is_ok());
    }

    #[test]
    fn body_limits() {
        assert_eq!(message_body("  hi there \n").unwrap(), "hi there");
        assert!(message_body(" \n\t ").is_err());
        assert!(message_body(&"a".repeat(MAX_BODY_CHARS)).is_ok());
        assert!(message_body(&"a".repeat(MAX_BODY_CHARS + 1)).is_err());
        // counted in characters, not bytes
        assert!(message_body(&"é".repeat(MAX_BODY_CHARS)).is_ok());
    }
}
