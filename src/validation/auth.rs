use crate::error::{AppError, Result};

/// Validates a login email.
///
/// Only an upper bound is enforced here: anything shorter is handed to the
/// constant-time credential comparison unchanged, so a wrong empty email and
/// a wrong long one are indistinguishable to the caller.
///
/// # Arguments
///
/// * `email` - The email to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the email is acceptable.
pub fn validate_email(email: &str) -> Result<()> {
    if email.len() > 255 {
        return Err(AppError::Validation(
            "Email must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a login password.
///
/// # Arguments
///
/// * `password` - The password to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the password is acceptable.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}
