//! Request-scoped view the router decides on.
//!
//! # Responsibilities
//! - Hold host, path, query parameters and cookies of one request
//! - Provide the absolute URL redirect targets are resolved against
//!
//! # Design Decisions
//! - Immutable once built; the router only reads it
//! - Host is lowercased, path kept exactly as received
//! - Independent of any HTTP runtime so decisions test without a server

use std::collections::HashMap;

use url::{form_urlencoded, ParseError, Url};

/// Immutable snapshot of the parts of a request the router looks at.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    host: String,
    path: String,
    query: Option<String>,
    params: Vec<(String, String)>,
    cookies: HashMap<String, String>,
    url: Url,
}

impl IncomingRequest {
    /// Build from the `Host` header and the request target.
    ///
    /// `scheme` is the scheme clients used to reach the edge. Fails only
    /// when no base URL can be built with it.
    pub fn new(scheme: &str, host: &str, path_and_query: &str) -> Result<Self, ParseError> {
        let host = host.trim().to_ascii_lowercase();
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (path_and_query, None),
        };
        let path = if path.is_empty() { "/" } else { path }.to_string();

        let params = query
            .as_deref()
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        let url = base_url(scheme, &host, &path, query.as_deref())?;

        Ok(Self {
            host,
            path,
            query,
            params,
            cookies: HashMap::new(),
            url,
        })
    }

    /// Attach cookies parsed from a `Cookie` header value.
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        for pair in header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                self.cookies
                    .entry(name.trim().to_string())
                    .or_insert_with(|| value.trim().to_string());
            }
        }
        self
    }

    /// Lowercased `Host` header, possibly empty.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// `?query` or the empty string.
    pub fn search(&self) -> String {
        match self.query.as_deref() {
            Some(q) if !q.is_empty() => format!("?{}", q),
            _ => String::new(),
        }
    }

    /// First decoded value of a query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k == name)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Cookie value, reassembling `name.0`, `name.1`, ... chunks when the
    /// plain cookie is absent.
    pub fn chunked_cookie(&self, name: &str) -> Option<String> {
        if let Some(value) = self.cookie(name) {
            return Some(value.to_string());
        }
        let mut joined = String::new();
        for i in 0.. {
            match self.cookies.get(&format!("{}.{}", name, i)) {
                Some(chunk) => joined.push_str(chunk),
                None => break,
            }
        }
        (!joined.is_empty()).then_some(joined)
    }

    /// Absolute URL of this request.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Path and query exactly as received.
    pub fn path_and_query(&self) -> String {
        format!("{}{}", self.path, self.search())
    }
}

/// Absolute URL of the request, falling back to `localhost` for hosts that
/// do not parse.
fn base_url(scheme: &str, host: &str, path: &str, query: Option<&str>) -> Result<Url, ParseError> {
    let target = match query {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    };
    for authority in [host, "localhost"] {
        if authority.is_empty() {
            continue;
        }
        if let Ok(url) = Url::parse(&format!("{}://{}{}", scheme, authority, target)) {
            return Ok(url);
        }
        if let Ok(url) = Url::parse(&format!("{}://{}/", scheme, authority)) {
            return Ok(url);
        }
    }
    Url::parse(&format!("{}://localhost/", scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_path_and_query() {
        let req = IncomingRequest::new("https", "App.Papermark.COM", "/login?next=%2Fsettings&x=a+b").unwrap();
        assert_eq!(req.host(), "app.papermark.com");
        assert_eq!(req.path(), "/login");
        assert_eq!(req.query(), Some("next=%2Fsettings&x=a+b"));
        assert_eq!(req.param("next"), Some("/settings"));
        assert_eq!(req.param("x"), Some("a b"));
        assert_eq!(req.search(), "?next=%2Fsettings&x=a+b");
        assert_eq!(req.url().as_str(), "https://app.papermark.com/login?next=%2Fsettings&x=a+b");
    }

    #[test]
    fn test_unusable_scheme_is_an_error() {
        assert!(IncomingRequest::new("not a scheme", "app.papermark.com", "/").is_err());
        let req = IncomingRequest::new("https", "bad host^", "/abc").unwrap();
        assert_eq!(req.url().host_str(), Some("localhost"));
    }

    #[test]
    fn test_flag_param_without_value() {
        let req = IncomingRequest::new("https", "app.papermark.com", "/dashboard?invitation").unwrap();
        assert!(req.has_param("invitation"));
        assert_eq!(req.param("invitation"), Some(""));
        assert!(!req.has_param("next"));
    }

    #[test]
    fn test_cookie_header_parsing() {
        let req = IncomingRequest::new("https", "h", "/").unwrap()
            .with_cookie_header("a=1; next-auth.session-token=abc.def; theme=dark");
        assert_eq!(req.cookie("next-auth.session-token"), Some("abc.def"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn test_chunked_cookie_reassembly() {
        let req = IncomingRequest::new("https", "h", "/").unwrap()
            .with_cookie_header("tok.1=def; tok.0=abc; tok.2=ghi");
        assert_eq!(req.chunked_cookie("tok").as_deref(), Some("abcdefghi"));
        assert_eq!(req.chunked_cookie("other"), None);
    }

    #[test]
    fn test_empty_host_still_has_url() {
        let req = IncomingRequest::new("https", "", "/abc").unwrap();
        assert_eq!(req.host(), "");
        assert_eq!(req.url().host_str(), Some("localhost"));
        assert_eq!(req.path_and_query(), "/abc");
    }
}
