use crate::error::{AppError, Result};

/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 8;
/// Maximum password length.
pub const PASSWORD_MAX_LEN: usize = 128;
/// Maximum display name length, in characters.
pub const DISPLAY_NAME_MAX_LEN: usize = 32;

/// Normalizes an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a display name and returns it trimmed.
///
/// Letters, digits, spaces and `.,_'-` only, 1 to 32 characters.
pub fn validate_display_name(display_name: &str) -> Result<String> {
    let display_name = display_name.trim();

    if display_name.is_empty() {
        return Err(AppError::Validation("Display name is required.".to_string()));
    }

    if display_name.chars().count() > DISPLAY_NAME_MAX_LEN {
        return Err(AppError::Validation(format!(
            "Display name must be at most {} characters.",
            DISPLAY_NAME_MAX_LEN
        )));
    }

    if !display_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || " .,_'-".contains(c))
    {
        return Err(AppError::Validation(
            "Please choose a simpler display name (letters, numbers, spaces, basic punctuation)."
                .to_string(),
        ));
    }

    Ok(display_name.to_string())
}

/// Validates a password.
///
/// # Arguments
///
/// * `password` - The password to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the password is valid.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters long.",
            PASSWORD_MIN_LEN
        )));
    }

    if password.len() > PASSWORD_MAX_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at most {} characters.",
            PASSWORD_MAX_LEN
        )));
    }

    Ok(())
}

/// Validates a new password against its confirmation.
pub fn validate_new_password(new_password: &str, confirm_password: &str) -> Result<()> {
    if new_password.is_empty() || confirm_password.is_empty() {
        return Err(AppError::Validation(
            "New password and confirmation are required.".to_string(),
        ));
    }

    if new_password != confirm_password {
        return Err(AppError::Validation(
            "New password and confirmation do not match.".to_string(),
        ));
    }

    validate_password(new_password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(validate_display_name("  Ann  ").unwrap(), "Ann");
        assert_eq!(validate_display_name("O'Brien, J.").unwrap(), "O'Brien, J.");
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name("<script>").is_err());
        assert!(validate_display_name(&"a".repeat(33)).is_err());
        assert!(validate_display_name(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("password123").is_ok());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn new_password_confirmation() {
        assert!(validate_new_password("", "").is_err());
        assert!(validate_new_password("password123", "password124").is_err());
        assert!(validate_new_password("short", "short").is_err());
        assert!(validate_new_password("password123", "password123").is_ok());
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
    }
}
