//! Field validation and normalization rules.
//!
//! These are the checks the contact forms apply before anything reaches the
//! store. The store boundary runs them again through the [`crate::fields`]
//! newtypes.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

/// Minimum username length.
pub const USERNAME_MIN: usize = 3;
/// Minimum password length.
pub const PASSWORD_MIN: usize = 6;
/// Minimum contact name length.
pub const NAME_MIN: usize = 2;
/// Maximum contact name length.
pub const NAME_MAX: usize = 50;
/// Minimum number of letters in a contact name.
pub const NAME_MIN_LETTERS: usize = 2;
/// Digits in a normalized phone number.
pub const PHONE_DIGITS: usize = 10;
/// Country calling code stripped from phone input.
pub const COUNTRY_CODE: &str = "91";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Check a username: at least [`USERNAME_MIN`] characters of ASCII letters,
/// digits and underscores.
pub fn check_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().count() < USERNAME_MIN {
        return Err(ValidationError::UsernameTooShort { min: USERNAME_MIN });
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameInvalidCharacters);
    }
    Ok(())
}

/// Check a password: at least [`PASSWORD_MIN`] characters.
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    Ok(())
}

fn is_name_special(c: char) -> bool {
    matches!(c, ' ' | '\'' | '-')
}

/// Check a contact name.
///
/// Rules, in the order they are reported:
/// 1. length between [`NAME_MIN`] and [`NAME_MAX`]
/// 2. only ASCII letters, spaces, apostrophes and hyphens
/// 3. no two special characters in a row
/// 4. no special character at either end
/// 5. at least [`NAME_MIN_LETTERS`] letters
pub fn check_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Err(ValidationError::NameLength {
            min: NAME_MIN,
            max: NAME_MAX,
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || is_name_special(c))
    {
        return Err(ValidationError::NameInvalidCharacters);
    }

    let consecutive = name
        .chars()
        .zip(name.chars().skip(1))
        .any(|(a, b)| is_name_special(a) && is_name_special(b));
    if consecutive {
        return Err(ValidationError::NameConsecutiveSpecials);
    }

    let starts = name.chars().next().is_some_and(is_name_special);
    let ends = name.chars().next_back().is_some_and(is_name_special);
    if starts || ends {
        return Err(ValidationError::NameEdgeSpecial);
    }

    let letters = name.chars().filter(char::is_ascii_alphabetic).count();
    if letters < NAME_MIN_LETTERS {
        return Err(ValidationError::NameTooFewLetters {
            min: NAME_MIN_LETTERS,
        });
    }

    Ok(())
}

/// Normalize a phone number to its canonical 10-digit form.
///
/// Spaces, dashes and parentheses are removed, then a leading `+91` is
/// stripped. A bare `91` prefix is stripped only when exactly ten digits
/// follow it, so national numbers that happen to begin with 91 survive.
pub fn normalize_phone(input: &str) -> Result<String, ValidationError> {
    let cleaned: String = input
        .chars()
        .filter(|&c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect();

    if cleaned.is_empty() {
        return Err(ValidationError::EmptyPhone);
    }

    let national = strip_country_code(&cleaned);

    let well_formed = national.len() == PHONE_DIGITS
        && national.bytes().all(|b| b.is_ascii_digit())
        && matches!(national.as_bytes().first(), Some(b'6'..=b'9'));

    if well_formed {
        Ok(national.to_string())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

fn strip_country_code(cleaned: &str) -> &str {
    if let Some(rest) = cleaned
        .strip_prefix('+')
        .and_then(|s| s.strip_prefix(COUNTRY_CODE))
    {
        return rest;
    }
    match cleaned.strip_prefix(COUNTRY_CODE) {
        Some(rest) if rest.len() == PHONE_DIGITS => rest,
        _ => cleaned,
    }
}

/// Normalize an optional email address.
///
/// Blank or whitespace-only input becomes `None`. Anything else is trimmed
/// and must look like `local@domain.tld`.
pub fn normalize_email(input: Option<&str>) -> Result<Option<String>, ValidationError> {
    let trimmed = match input.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    if email_regex().is_match(trimmed) {
        Ok(Some(trimmed.to_string()))
    } else {
        Err(ValidationError::InvalidEmail)
    }
}
