use std::fmt;
use url::form_urlencoded::byte_serialize;

/// Module used when a resource is addressed by model name only
pub const DEFAULT_MODULE: &str = "Main";

/// A model inside a module, e.g. `Main/Contacts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    module: String,
    model: String,
}

impl Resource {
    /// Address a model in the default `Main` module
    pub fn new(model: impl Into<String>) -> Self {
        Resource {
            module: DEFAULT_MODULE.to_string(),
            model: model.into(),
        }
    }

    /// Address a model in a specific module
    pub fn in_module(module: impl Into<String>, model: impl Into<String>) -> Self {
        Resource {
            module: module.into(),
            model: model.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Path segments below the base URL, followed by `extra`
    pub(crate) fn segments<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec![self.module.as_str(), self.model.as_str()];
        segments.extend_from_slice(extra);
        segments
    }
}

impl From<&str> for Resource {
    fn from(model: &str) -> Self {
        Resource::new(model)
    }
}

impl From<String> for Resource {
    fn from(model: String) -> Self {
        Resource::new(model)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module, self.model)
    }
}

/// One condition of a filtered listing.
///
/// Field and value are form-urlencoded when the query string is built, so a
/// value may safely contain `&` or `=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    field: String,
    value: Option<String>,
}

impl Filter {
    /// Match `field` against `value`
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter {
            field: field.into(),
            value: Some(value.into()),
        }
    }

    /// A bare flag with no value, rendered as `field`
    pub fn flag(field: impl Into<String>) -> Self {
        Filter {
            field: field.into(),
            value: None,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn encode(&self) -> String {
        let field: String = byte_serialize(self.field.as_bytes()).collect();
        match &self.value {
            Some(value) => {
                let value: String = byte_serialize(value.as_bytes()).collect();
                format!("{}={}", field, value)
            }
            None => field,
        }
    }
}

/// Split a `field=value` string at the first `=`
impl From<&str> for Filter {
    fn from(raw: &str) -> Self {
        match raw.split_once('=') {
            Some((field, value)) => Filter::new(field, value),
            None => Filter::flag(raw),
        }
    }
}

/// Join filters into a query string, `None` when there are none.
/// Filters without a field name are skipped.
pub(crate) fn query_string(filters: &[Filter]) -> Option<String> {
    let parts: Vec<String> = filters
        .iter()
        .filter(|filter| !filter.field.is_empty())
        .map(Filter::encode)
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("&"))
}
