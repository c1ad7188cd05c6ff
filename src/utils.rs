use std::path::Path;

use uuid::Uuid;

/// Extracts the file extension from a filename and converts it to lowercase.
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Generates a short public share token: the first 10 hex digits of a v4
/// UUID, ~40 bits of randomness. The store rejects the rare collision and
/// the upload path retries with a fresh token.
pub fn generate_share_id() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}
