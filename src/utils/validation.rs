use validator::{ValidateUrl, ValidationError};

/// Similarity ratio above which a password counts as too close to a user attribute.
pub const MAX_SIMILARITY: f64 = 0.7;

/// Passwords rejected outright regardless of length.
const COMMON_PASSWORDS: &[&str] = &[
    "123456", "123456789", "12345678", "password", "qwerty", "qwerty123", "1234567890",
    "1234567", "111111", "000000", "123123", "abc123", "password1", "password123", "iloveyou",
    "admin", "admin123", "welcome", "welcome1", "letmein", "monkey", "dragon", "football",
    "baseball", "sunshine", "princess", "master", "shadow", "superman", "trustno1",
    "passw0rd", "zaq12wsx", "qwertyuiop", "1q2w3e4r", "starwars", "whatever",
];

/// Usernames may contain letters, digits and `@ . + - _`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_username");
        err.message = Some(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        );
        Err(err)
    }
}

/// Blank is allowed; anything else must parse as a URL.
pub fn is_blank_or_url(value: &str) -> bool {
    value.trim().is_empty() || value.validate_url()
}

/// Checks a candidate password against the registration policy and returns
/// every violated rule as a user-facing message.
pub fn password_problems(
    password: &str,
    username: &str,
    email: &str,
    min_length: usize,
) -> Vec<String> {
    let mut problems = Vec::new();
    let lowered = password.to_lowercase();

    for (attribute, label) in [(username, "username"), (email, "email address")] {
        if is_too_similar(&lowered, attribute) {
            problems.push(format!("The password is too similar to the {}.", label));
            break;
        }
    }

    if password.chars().count() < min_length {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            min_length
        ));
    }

    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push("This password is too common.".to_string());
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    problems
}

fn is_too_similar(password: &str, attribute: &str) -> bool {
    let attribute = attribute.to_lowercase();
    if attribute.is_empty() || password.is_empty() {
        return false;
    }

    let password_len = password.chars().count();
    std::iter::once(attribute.as_str())
        .chain(attribute.split(|c: char| !c.is_alphanumeric()))
        .filter(|part| part.chars().count() >= 3)
        .filter(|part| !exceeds_length_ratio(password_len, part.chars().count()))
        .any(|part| similarity(password, part) >= MAX_SIMILARITY)
}

/// True when `password_len` is so far above `value_len` that the similarity
/// ratio cannot reach [`MAX_SIMILARITY`]; the comparison is skipped then.
fn exceeds_length_ratio(password_len: usize, value_len: usize) -> bool {
    let bound = MAX_SIMILARITY / 2.0 * password_len as f64;
    password_len >= 10 * value_len && (value_len as f64) < bound
}

/// Ratio in `[0, 1]`: twice the longest common subsequence over the combined length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (2 * prev[b.len()]) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_passes() {
        assert!(password_problems("Corr3ct-Horse-Battery", "alice", "alice@example.com", 8).is_empty());
    }

    #[test]
    fn test_short_password() {
        let problems = password_problems("x7#q", "alice", "alice@example.com", 8);
        assert!(problems.iter().any(|p| p.contains("too short")));
    }

    #[test]
    fn test_common_and_numeric_password() {
        let problems = password_problems("12345678", "alice", "alice@example.com", 8);
        assert!(problems.contains(&"This password is too common.".to_string()));
        assert!(problems.contains(&"This password is entirely numeric.".to_string()));
    }

    #[test]
    fn test_password_similar_to_username() {
        let problems = password_problems("alicesmith1", "alicesmith", "a@example.com", 8);
        assert_eq!(problems, vec!["The password is too similar to the username."]);
    }

    #[test]
    fn test_password_similar_to_email_part() {
        let problems = password_problems("bobbuilder", "someone", "bobbuilder@example.com", 8);
        assert_eq!(problems, vec!["The password is too similar to the email address."]);
    }

    #[test]
    fn test_long_password_not_compared_with_short_attribute() {
        assert!(exceeds_length_ratio(100, 5));
        assert!(!exceeds_length_ratio(12, 5));
        assert!(!is_too_similar(&"cinephile".repeat(20), "cinephile"));
        assert!(is_too_similar("cinephile1", "cinephile"));
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert!((similarity("abcd", "abxd") - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_username_characters() {
        assert!(validate_username("film.buff+42@home_x-y").is_ok());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("semi;colon").is_err());
    }

    #[test]
    fn test_blank_or_url() {
        assert!(is_blank_or_url(""));
        assert!(is_blank_or_url("https://example.com/trailer"));
        assert!(!is_blank_or_url("not a url"));
    }
}
