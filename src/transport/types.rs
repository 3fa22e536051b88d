use crate::error::RequestSummary;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Receives the cumulative number of body bytes handed to the network
pub type ByteProgress = Arc<dyn Fn(u64) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
        }
    }
}

/// A single value of a form body
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        data: Bytes,
        file_name: String,
        content_type: String,
    },
}

/// Ordered multipart form fields
///
/// Empty and absent values are never added, so optional settings can be
/// passed straight through without checks at every call site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.fields.push((name.into(), FormValue::Text(value)));
        }
        self
    }

    pub fn optional_text<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        data: Bytes,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File {
                data,
                file_name: file_name.into(),
                content_type: content_type.into(),
            },
        ));
        self
    }

    /// Adds `metadata[key]` fields
    pub fn metadata(self, metadata: Option<&BTreeMap<String, String>>) -> Self {
        let Some(metadata) = metadata else {
            return self;
        };

        metadata.iter().fold(self, |form, (key, value)| {
            form.text(format!("metadata[{}]", key), value)
        })
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<(String, FormValue)> {
        self.fields
    }

    /// Text value of the first field with this name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(field, value)| match value {
            FormValue::Text(text) if field == name => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Form(FormData),
    Bytes(Bytes),
}

/// A request handed to a [`super::Transport`]
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub on_upload_progress: Option<ByteProgress>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .finish()
    }
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            on_upload_progress: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn form(mut self, form: FormData) -> Self {
        self.body = RequestBody::Form(form);
        self
    }

    pub fn bytes(mut self, data: Bytes) -> Self {
        self.body = RequestBody::Bytes(data);
        self
    }

    pub fn on_upload_progress(mut self, callback: Option<ByteProgress>) -> Self {
        self.on_upload_progress = callback;
        self
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary::new(self.method.to_string(), self.url.clone())
    }

    pub fn form_data(&self) -> Option<&FormData> {
        match &self.body {
            RequestBody::Form(form) => Some(form),
            _ => None,
        }
    }
}

/// What a [`super::Transport`] got back
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    pub request: RequestSummary,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
