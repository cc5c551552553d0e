//! Display helpers for tab data.

use url::Url;

/// Host component of `url`, or an empty string when it has none or does not
/// parse.
pub fn domain_of(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Formats accumulated milliseconds as `42s`, `3m 5s` or `2h 14m`.
pub fn format_time_spent(ms: i64) -> String {
    if ms <= 0 {
        return "0s".to_string();
    }
    let seconds = ms / 1000;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m {}s", seconds % 60);
    }
    let hours = minutes / 60;
    format!("{hours}h {}m", minutes % 60)
}

/// Strips the scheme and a leading `www.`, then truncates to `max_len`
/// characters followed by `...`.
pub fn format_url(url: &str, max_len: usize) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let stripped = stripped.strip_prefix("www.").unwrap_or(stripped);
    truncate(stripped, max_len)
}

/// Truncates to `max_len` characters, appending `...` when anything was cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_extraction() {
        assert_eq!(domain_of("https://docs.rs/serde/latest"), "docs.rs");
        assert_eq!(domain_of("http://localhost:8080/x"), "localhost");
        assert_eq!(domain_of(""), "");
        assert_eq!(domain_of("not a url"), "");
        assert_eq!(domain_of("about:blank"), "");
    }

    #[test]
    fn time_spent_formatting() {
        assert_eq!(format_time_spent(0), "0s");
        assert_eq!(format_time_spent(-5), "0s");
        assert_eq!(format_time_spent(999), "0s");
        assert_eq!(format_time_spent(42_000), "42s");
        assert_eq!(format_time_spent(185_000), "3m 5s");
        assert_eq!(format_time_spent(8_040_000), "2h 14m");
    }

    #[test]
    fn url_formatting() {
        assert_eq!(format_url("https://www.rust-lang.org/learn", 50), "rust-lang.org/learn");
        assert_eq!(format_url("http://example.com", 50), "example.com");
        assert_eq!(format_url("https://example.com/abcdef", 11), "example.com...");
        assert_eq!(format_url("", 10), "");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
        assert_eq!(truncate("short", 5), "short");
    }
}
