//! Field-level input validation for account operations.
//!
//! Validation failures are collected per field rather than short-circuiting,
//! so a response names every violated rule.

use serde::Serialize;
use validator::ValidateEmail;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The offending field.
    pub field: String,
    /// Human-readable message naming the violated rule.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a username: required, minimum length.
pub fn validate_username(username: &str, errors: &mut Vec<FieldError>) {
    if username.is_empty() {
        errors.push(FieldError::new("username", "Username is required."));
    } else if username.chars().count() < MIN_USERNAME_LENGTH {
        errors.push(FieldError::new(
            "username",
            format!("Username must be at least {MIN_USERNAME_LENGTH} characters."),
        ));
    }
}

/// Validate an email address: required, well-formed.
pub fn validate_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required."));
    } else if !email.validate_email() {
        errors.push(FieldError::new("email", "Invalid email address."));
    }
}

/// Validate password complexity.
///
/// Four rules beyond the length minimum: at least one lowercase letter, one
/// uppercase letter, one digit and one special character. Every violated rule
/// produces its own message.
pub fn validate_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required."));
        return;
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters."),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(FieldError::new(
            "password",
            "Password must include at least one lowercase letter.",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(FieldError::new(
            "password",
            "Password must include at least one uppercase letter.",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new(
            "password",
            "Password must include at least one number.",
        ));
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        errors.push(FieldError::new(
            "password",
            "Password must include at least one special character.",
        ));
    }
}

/// Validate the password confirmation field.
pub fn validate_confirm_password(
    password: &str,
    confirm_password: &str,
    errors: &mut Vec<FieldError>,
) {
    if confirm_password.is_empty() {
        errors.push(FieldError::new(
            "confirmPassword",
            "Confirm password is required.",
        ));
    } else if password != confirm_password {
        errors.push(FieldError::new(
            "confirmPassword",
            "Confirm Password do not match.",
        ));
    }
}

/// Validate a registration request. Returns every violated rule.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    validate_username(username, &mut errors);
    validate_email(email, &mut errors);
    validate_password(password, &mut errors);
    validate_confirm_password(password, confirm_password, &mut errors);
    errors
}

/// Validate a login request shape.
pub fn validate_login(email: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    validate_email(email, &mut errors);
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required."));
    }
    errors
}

/// Validate a password reset request: same password rules as registration.
pub fn validate_password_reset(
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    validate_email(email, &mut errors);
    validate_password(password, &mut errors);
    validate_confirm_password(password, confirm_password, &mut errors);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages_for<'a>(errors: &'a [FieldError], field: &str) -> Vec<&'a str> {
        errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    #[test]
    fn test_valid_registration() {
        let errors = validate_registration(
            "alice",
            "alice@example.com",
            "Str0ng-pass",
            "Str0ng-pass",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_username_rules() {
        let mut errors = Vec::new();
        validate_username("", &mut errors);
        assert_eq!(messages_for(&errors, "username"), ["Username is required."]);

        let mut errors = Vec::new();
        validate_username("ab", &mut errors);
        assert_eq!(
            messages_for(&errors, "username"),
            ["Username must be at least 3 characters."]
        );
    }

    #[test]
    fn test_email_rules() {
        let mut errors = Vec::new();
        validate_email("", &mut errors);
        assert_eq!(messages_for(&errors, "email"), ["Email is required."]);

        let mut errors = Vec::new();
        validate_email("not-an-email", &mut errors);
        assert_eq!(messages_for(&errors, "email"), ["Invalid email address."]);

        let mut errors = Vec::new();
        validate_email("ok@example.com", &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_password_names_each_violated_rule() {
        let mut errors = Vec::new();
        // Too short, no uppercase, no digit, no special
        validate_password("abc", &mut errors);
        let messages = messages_for(&errors, "password");
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().any(|m| m.contains("at least 8 characters")));
        assert!(messages.iter().any(|m| m.contains("uppercase")));
        assert!(messages.iter().any(|m| m.contains("number")));
        assert!(messages.iter().any(|m| m.contains("special character")));
    }

    #[test]
    fn test_password_single_missing_rule() {
        let mut errors = Vec::new();
        validate_password("Abcdefg1", &mut errors);
        let messages = messages_for(&errors, "password");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("special character"));
    }

    #[test]
    fn test_empty_password_reports_only_required() {
        let mut errors = Vec::new();
        validate_password("", &mut errors);
        assert_eq!(messages_for(&errors, "password"), ["Password is required."]);
    }

    #[test]
    fn test_confirm_password_rules() {
        let mut errors = Vec::new();
        validate_confirm_password("Str0ng-pass", "", &mut errors);
        assert_eq!(
            messages_for(&errors, "confirmPassword"),
            ["Confirm password is required."]
        );

        let mut errors = Vec::new();
        validate_confirm_password("Str0ng-pass", "Other-pass1!", &mut errors);
        assert_eq!(
            messages_for(&errors, "confirmPassword"),
            ["Confirm Password do not match."]
        );
    }

    #[test]
    fn test_login_shape() {
        assert!(validate_login("alice@example.com", "anything").is_empty());

        let errors = validate_login("", "");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[1].field, "password");
    }

    #[test]
    fn test_reset_uses_registration_password_rules() {
        let errors = validate_password_reset("alice@example.com", "weak", "weak");
        assert!(errors.iter().any(|e| e.field == "password"));
        assert!(errors.iter().all(|e| e.field != "confirmPassword"));
    }
}
