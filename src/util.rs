//! Small utility helpers used across modules.

/// Case-insensitive string equality (full Unicode lowercasing).
/// Used wherever authored text is compared against learner input.
pub fn eq_fold(a: &str, b: &str) -> bool {
  a.to_lowercase() == b.to_lowercase()
}

/// Split a sentence into word tokens on whitespace.
/// This is the canonical tokenization for reading/listening word banks.
pub fn tokenize(text: &str) -> Vec<String> {
  text.split_whitespace().map(|t| t.to_string()).collect()
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> u64 {
  std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .map(|d| d.as_millis() as u64)
    .unwrap_or(0)
}

/// Day of week for an epoch-ms timestamp, 0-6 with 0 = Sunday (UTC).
pub fn day_of_week_utc(epoch_ms: u64) -> u8 {
  // 1970-01-01 was a Thursday.
  (((epoch_ms / 86_400_000) + 4) % 7) as u8
}

/// Hour of day for an epoch-ms timestamp, 0-23 (UTC).
pub fn hour_of_day_utc(epoch_ms: u64) -> u8 {
  ((epoch_ms / 3_600_000) % 24) as u8
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn eq_fold_ignores_case() {
    assert!(eq_fold("Hola", "hola"));
    assert!(eq_fold("AGUA", "agua"));
    assert!(!eq_fold("hola", "adiós"));
  }

  #[test]
  fn epoch_day_zero_is_thursday() {
    assert_eq!(day_of_week_utc(0), 4);
    assert_eq!(hour_of_day_utc(0), 0);
    // 1970-01-04 was a Sunday; noon UTC.
    let sunday_noon = 3 * 86_400_000 + 12 * 3_600_000;
    assert_eq!(day_of_week_utc(sunday_noon), 0);
    assert_eq!(hour_of_day_utc(sunday_noon), 12);
  }

  #[test]
  fn tokenize_splits_on_any_whitespace() {
    assert_eq!(tokenize("el gato  bebe\tagua"), vec!["el", "gato", "bebe", "agua"]);
    assert!(tokenize("   ").is_empty());
  }
}
