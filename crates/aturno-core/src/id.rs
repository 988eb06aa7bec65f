//! Entity id generation.
//!
//! Ids have the form `<prefix>_<epoch millis>_<7 base-36 chars>`, e.g.
//! `task_1718035200123_k3f9x2a`. They are assigned once at creation.

use chrono::{DateTime, Utc};
use rand::Rng;

const SUFFIX_LEN: usize = 7;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a fresh id with the current time
pub fn generate(prefix: &str) -> String {
    generate_at(prefix, Utc::now())
}

/// Generate a fresh id for the given creation time
pub fn generate_at(prefix: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{prefix}_{}_{suffix}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_shape() {
        let now = Utc.timestamp_millis_opt(1_718_035_200_123).unwrap();
        let id = generate_at("proj", now);
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "proj");
        assert_eq!(parts[1], "1718035200123");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn ids_differ_within_same_millisecond() {
        let now = Utc::now();
        let a = generate_at("task", now);
        let b = generate_at("task", now);
        assert_ne!(a, b);
    }
}
