/// Cryptography module for credential verification
///
/// Handles the legacy PBKDF2-SHA256 password hash format shared with the
/// previous HR system

pub mod password;
