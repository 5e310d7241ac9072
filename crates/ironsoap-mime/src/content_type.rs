use std::collections::HashMap;
use std::fmt::Display;

/// Parameters of a MIME `Content-Type` header value.
///
/// `multipart/related; type="application/xop+xml"; boundary=uuid` yields the
/// media type `multipart/related` plus the `type` and `boundary` parameters.
/// Parameter names are stored lower-cased and looked up case-insensitively.
/// Values keep their case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypeParams {
    media_type: Option<String>,
    params: HashMap<String, String>,
}

impl ContentTypeParams {
    /// Parse a header value. There is no failure path: tokens that do not make
    /// sense are skipped and the result may be empty.
    pub fn parse(value: &str) -> Self {
        let mut parsed = Self::default();

        for token in value.split(';').map(str::trim) {
            if token.is_empty() {
                continue;
            }

            match token.split_once('=') {
                Some((name, raw_value)) => {
                    parsed
                        .params
                        .insert(name.trim().to_ascii_lowercase(), unquote(raw_value));
                }
                None => parsed.media_type = Some(token.to_owned()),
            }
        }

        parsed
    }

    /// The bare media type, e.g. `multipart/related`.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Case-insensitive comparison of parameter `name` against `expected`.
    /// A missing parameter never matches.
    pub fn param_eq(&self, name: &str, expected: &str) -> bool {
        self.get(name)
            .is_some_and(|value| value.eq_ignore_ascii_case(expected))
    }

    pub fn media_type_eq(&self, expected: &str) -> bool {
        self.media_type()
            .is_some_and(|value| value.eq_ignore_ascii_case(expected))
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len() + usize::from(self.media_type.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for ContentTypeParams {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl Display for ContentTypeParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        if let Some(media_type) = &self.media_type {
            write!(f, "{media_type}")?;
            first = false;
        }

        let mut params: Vec<_> = self.params.iter().collect();
        params.sort();
        for (name, value) in params {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{name}=\"{value}\"")?;
            first = false;
        }

        Ok(())
    }
}

/// Strip one leading and one trailing double quote, then trim.
fn unquote(raw: &str) -> String {
    let value = raw.trim();
    let value = value.strip_prefix('"').unwrap_or(value);
    let value = value.strip_suffix('"').unwrap_or(value);
    value.trim().to_owned()
}
