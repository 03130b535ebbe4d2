use http::Method;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::str::FromStr;

/// One incoming request, reduced to what the validator reads.
///
/// Header names are stored lowercased. The query string is kept raw; it is
/// decoded on demand by [`ValidationRequest::query_params`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    /// HTTP method
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query: String,
    /// Headers with lowercase names
    pub headers: HashMap<String, String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl ValidationRequest {
    /// Build a request from a method and a request target such as `/users?limit=10`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            method,
            path: path.to_string(),
            query: query.to_string(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Parse the method from text; unknown tokens become extension methods.
    pub fn parse(method: &str, target: &str) -> Result<Self, http::method::InvalidMethod> {
        let method = Method::from_str(&method.to_ascii_uppercase())?;
        Ok(Self::new(method, target))
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Build from an [`http::Request`]. Headers that are not valid UTF-8 are skipped.
    pub fn from_http<B: AsRef<[u8]>>(req: &http::Request<B>) -> Self {
        let target = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string());
        let mut out = Self::new(req.method().clone(), &target);
        for (name, value) in req.headers() {
            if let Ok(v) = value.to_str() {
                out.headers.insert(name.as_str().to_string(), v.to_string());
            }
        }
        out.body = req.body().as_ref().to_vec();
        out
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Content type up to the first `;`, lowercased and trimmed.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(media_type_essence)
    }

    /// Decoded query parameters in first-seen order. Repeated names keep every value.
    pub fn query_params(&self) -> IndexMap<String, Vec<String>> {
        parse_query_params(&self.query)
    }
}

/// Split a request target into path and raw query.
pub fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

/// Decode a raw query string with `application/x-www-form-urlencoded` rules.
pub fn parse_query_params(query: &str) -> IndexMap<String, Vec<String>> {
    let mut params: IndexMap<String, Vec<String>> = IndexMap::new();
    for (k, v) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        params.entry(k.into_owned()).or_default().push(v.into_owned());
    }
    params
}

/// `text/html; charset=utf-8` becomes `text/html`.
pub fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_split_and_query_decoded() {
        let req = ValidationRequest::new(Method::GET, "/users?name=J%20Doe&tag=a&tag=b&flag");
        assert_eq!(req.path, "/users");
        let params = req.query_params();
        assert_eq!(params["name"], vec!["J Doe"]);
        assert_eq!(params["tag"], vec!["a", "b"]);
        assert_eq!(params["flag"], vec![""]);
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["name", "tag", "flag"]);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = ValidationRequest::new(Method::POST, "/")
            .with_header("Content-Type", "Application/JSON; charset=utf-8");
        assert_eq!(req.header("content-type"), Some("Application/JSON; charset=utf-8"));
        assert_eq!(req.content_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn built_from_http_request() {
        let req = http::Request::builder()
            .method("PUT")
            .uri("/items/7?dry=true")
            .header("Accept", "application/json")
            .body(b"{}".to_vec())
            .unwrap();
        let req = ValidationRequest::from_http(&req);
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.path, "/items/7");
        assert_eq!(req.query, "dry=true");
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.body, b"{}");
    }

    #[test]
    fn method_text_is_normalised() {
        let req = ValidationRequest::parse("get", "/").unwrap();
        assert_eq!(req.method, Method::GET);
    }
}
