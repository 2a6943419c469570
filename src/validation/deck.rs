use crate::error::{AppError, Result};
use crate::models::deck::{DeckFields, DEFAULT_FORMAT};

const NAME_MAX_LEN: usize = 100;
const DESCRIPTION_MAX_LEN: usize = 2000;
const COMMANDER_MAX_LEN: usize = 200;
const FORMAT_MAX_LEN: usize = 32;

/// Trims and checks deck input.
///
/// The name is required. An empty commander becomes `None`, an empty
/// format falls back to `commander`.
pub fn validate_deck_fields(
    name: &str,
    description: Option<&str>,
    format: Option<&str>,
    commander_name: Option<&str>,
) -> Result<DeckFields> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Deck name is required.".to_string()));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(AppError::Validation(format!(
            "Deck name must be at most {} characters.",
            NAME_MAX_LEN
        )));
    }

    let description = description.map(str::trim).unwrap_or_default();
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(AppError::Validation(format!(
            "Description must be at most {} characters.",
            DESCRIPTION_MAX_LEN
        )));
    }

    let format = match format.map(str::trim) {
        Some(f) if !f.is_empty() => f.to_lowercase(),
        _ => DEFAULT_FORMAT.to_string(),
    };
    if format.chars().count() > FORMAT_MAX_LEN {
        return Err(AppError::Validation("Format tag is too long.".to_string()));
    }

    let commander_name = commander_name
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    if commander_name
        .as_deref()
        .is_some_and(|c| c.chars().count() > COMMANDER_MAX_LEN)
    {
        return Err(AppError::Validation("Commander name is too long.".to_string()));
    }

    Ok(DeckFields {
        name: name.to_string(),
        description: description.to_string(),
        format,
        commander_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        assert!(matches!(
            validate_deck_fields("   ", None, None, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn defaults_and_trimming() {
        let fields =
            validate_deck_fields("  Atraxa Superfriends ", Some(" pw "), None, Some("  ")).unwrap();
        assert_eq!(fields.name, "Atraxa Superfriends");
        assert_eq!(fields.description, "pw");
        assert_eq!(fields.format, "commander");
        assert_eq!(fields.commander_name, None);
    }

    #[test]
    fn keeps_commander_and_format() {
        let fields = validate_deck_fields(
            "Elves",
            None,
            Some("Legacy"),
            Some("Lathril, Blade of the Elves"),
        )
        .unwrap();
        assert_eq!(fields.format, "legacy");
        assert_eq!(
            fields.commander_name.as_deref(),
            Some("Lathril, Blade of the Elves")
        );
    }

    #[test]
    fn overlong_fields_are_rejected() {
        assert!(validate_deck_fields(&"n".repeat(101), None, None, None).is_err());
        assert!(validate_deck_fields("ok", Some(&"d".repeat(2001)), None, None).is_err());
    }
}
