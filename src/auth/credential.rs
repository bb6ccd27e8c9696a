use serde::Serialize;
use std::collections::HashMap;

/// Cookie pairs in the order they were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cookies(Vec<(String, String)>);

impl Cookies {
    /// Parse a `key1=value1; key2=value2` string. Segments without `=` or with
    /// an empty name are dropped; a repeated name keeps its first position and
    /// takes the last value.
    pub fn parse(raw: &str) -> Self {
        let mut cookies = Cookies::default();

        for segment in raw.split(';') {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            cookies.insert(key, value.trim());
        }

        cookies
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a `Cookie` request header value.
    pub fn header_value(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Credential material attached to every request of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credential {
    #[default]
    None,
    Bearer(String),
    Cookies(Cookies),
}

impl Credential {
    /// Build from user input. A token wins over a cookie string when both are
    /// given; blank input counts as absent.
    pub fn build(token: Option<&str>, cookies: Option<&str>) -> Self {
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            return Credential::Bearer(token.to_string());
        }

        if let Some(raw) = cookies {
            let parsed = Cookies::parse(raw);
            if parsed.is_empty() {
                tracing::warn!("cookie string contained no name=value pairs, ignoring it");
                return Credential::None;
            }
            return Credential::Cookies(parsed);
        }

        Credential::None
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credential::None => "none",
            Credential::Bearer(_) => "bearer",
            Credential::Cookies(_) => "cookie",
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, Credential::None)
    }

    /// Merge the credential's headers over `base`.
    pub fn headers(&self, base: &HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = base.clone();

        if let Credential::Bearer(token) = self {
            merged.retain(|k, _| !k.eq_ignore_ascii_case("authorization"));
            merged.insert("Authorization".to_string(), format!("Bearer {}", token));
        }

        merged
    }

    pub fn cookies(&self) -> Cookies {
        match self {
            Credential::Cookies(cookies) => cookies.clone(),
            _ => Cookies::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_string() {
        let cookies = Cookies::parse("a=1; b=2");
        let pairs: Vec<_> = cookies.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_parse_trims_and_keeps_order() {
        let cookies = Cookies::parse("  session = abc123 ;token=xyz=789;  z=last ");
        let pairs: Vec<_> = cookies.iter().collect();
        assert_eq!(
            pairs,
            vec![("session", "abc123"), ("token", "xyz=789"), ("z", "last")]
        );
    }

    #[test]
    fn test_parse_drops_malformed_segments() {
        let cookies = Cookies::parse("a=1; garbage; =nokey; ; b=2");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("b"), Some("2"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let raw = "a=1; b=2; c=3";
        let first = Cookies::parse(raw);
        let second = Cookies::parse(&first.header_value());
        assert_eq!(first, second);
        assert_eq!(Cookies::parse(raw), first);
    }

    #[test]
    fn test_repeated_cookie_name_keeps_position() {
        let cookies = Cookies::parse("a=1; b=2; a=3");
        assert_eq!(cookies.header_value(), "a=3; b=2");
    }

    #[test]
    fn test_token_takes_precedence_over_cookies() {
        let cred = Credential::build(Some("tok"), Some("a=1"));
        assert_eq!(cred, Credential::Bearer("tok".into()));
        assert_eq!(cred.kind(), "bearer");
    }

    #[test]
    fn test_build_without_input_is_none() {
        assert_eq!(Credential::build(None, None), Credential::None);
        assert_eq!(Credential::build(Some("   "), None), Credential::None);
        assert_eq!(Credential::build(None, Some("junk")), Credential::None);
    }

    #[test]
    fn test_bearer_headers_override_base() {
        let mut base = HashMap::new();
        base.insert("authorization".to_string(), "Basic old".to_string());
        base.insert("X-Trace".to_string(), "1".to_string());

        let headers = Credential::Bearer("abc".into()).headers(&base);
        assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer abc"));
        assert!(!headers.contains_key("authorization"));
        assert_eq!(headers.get("X-Trace").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_cookie_credential_leaves_headers_unchanged() {
        let mut base = HashMap::new();
        base.insert("X-Trace".to_string(), "1".to_string());

        let cred = Credential::build(None, Some("sid=42"));
        assert_eq!(cred.headers(&base), base);
        assert_eq!(cred.cookies().get("sid"), Some("42"));
        assert!(Credential::Bearer("t".into()).cookies().is_empty());
    }
}
