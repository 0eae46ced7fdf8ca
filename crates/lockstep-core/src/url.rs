//! Cache-busting for fixture URLs.

use rand::Rng;

/// Append a time-and-random query value so the host cannot serve a cached response.
///
/// `data/test.html` becomes `data/test.html?<digits>`, `data/test.php?foo=bar` becomes
/// `data/test.php?foo=bar&<digits>`.
pub fn url(value: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let salt: u32 = rand::thread_rng().gen_range(0..100_000);
    with_stamp(value, &format!("{millis}{salt}"))
}

fn with_stamp(value: &str, stamp: &str) -> String {
    let separator = if value.contains('?') { '&' } else { '?' };
    format!("{value}{separator}{stamp}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn plain_url_gets_query() {
        let re = Regex::new(r"^a\.html\?\d+$").unwrap();
        let out = url("a.html");
        assert!(re.is_match(&out), "unexpected url: {out}");
    }

    #[test]
    fn existing_query_is_extended() {
        let re = Regex::new(r"^a\.php\?x=1&\d+$").unwrap();
        let out = url("a.php?x=1");
        assert!(re.is_match(&out), "unexpected url: {out}");
    }

    #[test]
    fn stamp_is_appended_verbatim() {
        assert_eq!(with_stamp("a.html", "123"), "a.html?123");
        assert_eq!(with_stamp("a.html?", "123"), "a.html?&123");
    }
}
