use uuid::Uuid;

/// Length of a verification code in hex characters
pub const CODE_LENGTH: usize = 32;

/// Generates a fresh verification code: a random v4 UUID without separators,
/// uppercased. Codes do not depend on card content.
pub fn generate_code() -> String {
    let mut code = Uuid::new_v4().simple().to_string();
    code.truncate(CODE_LENGTH);
    code.make_ascii_uppercase();
    code
}

/// True when `code` has the shape of an issued code (32 uppercase hex digits)
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}
