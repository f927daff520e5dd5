use crate::errors::{TrackerError, TrackerResult};
use once_cell::sync::Lazy;
use regex::Regex;

const PASSWORD_SPECIALS: &str = "@$!%*?&";

static STUDENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{9}$").expect("student id pattern"));
static UNIVERSITY_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@nmu\.edu\.eg$").expect("email pattern"));

pub fn validate_name(name: &str) -> TrackerResult<()> {
    if name.trim().chars().count() < 3 {
        return Err(TrackerError::Validation(
            "Please enter a valid name (at least 3 characters)".into(),
        ));
    }
    Ok(())
}

pub fn validate_student_id(student_id: &str) -> TrackerResult<()> {
    if !STUDENT_ID.is_match(student_id) {
        return Err(TrackerError::Validation(
            "Please enter a valid student ID (9 digits)".into(),
        ));
    }
    Ok(())
}

pub fn validate_university_email(email: &str) -> TrackerResult<()> {
    if !UNIVERSITY_EMAIL.is_match(email) {
        return Err(TrackerError::Validation(
            "Please enter a valid NMU university email (example@nmu.edu.eg)".into(),
        ));
    }
    Ok(())
}

/// At least 8 characters from letters, digits and `@$!%*?&`, with one of each class.
pub fn validate_password(password: &str) -> TrackerResult<()> {
    let special = |c: char| PASSWORD_SPECIALS.contains(c);
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || special(c));
    let strong = password.chars().count() >= 8
        && allowed
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(special);
    if !strong {
        return Err(TrackerError::Validation(
            "Password must contain at least 8 characters, one uppercase letter, one lowercase letter, one number and one special character (@$!%*?&)".into(),
        ));
    }
    Ok(())
}
