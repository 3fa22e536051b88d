//! `reqwest` backed transport

use super::types::{ByteProgress, FormData, FormValue, HttpRequest, HttpResponse, Method, RequestBody};
use super::Transport;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_LENGTH;
use reqwest::multipart::{Form, Part};
use std::collections::HashMap;

/// Slice size used when streaming byte bodies, so progress is reported
/// while a part is in flight
const STREAM_SLICE: usize = 64 * 1024;

/// Production transport built on a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_multipart(form: FormData) -> Result<Form> {
    let mut multipart = Form::new();

    for (name, value) in form.into_fields() {
        multipart = match value {
            FormValue::Text(text) => multipart.text(name, text),
            FormValue::File {
                data,
                file_name,
                content_type,
            } => {
                let length = data.len() as u64;
                let part = Part::stream_with_length(data, length)
                    .file_name(file_name)
                    .mime_str(&content_type)?;
                multipart.part(name, part)
            }
        };
    }

    Ok(multipart)
}

fn progress_body(data: Bytes, on_progress: Option<ByteProgress>) -> reqwest::Body {
    let Some(on_progress) = on_progress else {
        return reqwest::Body::from(data);
    };

    let slices: Vec<Bytes> = (0..data.len())
        .step_by(STREAM_SLICE)
        .map(|start| data.slice(start..(start + STREAM_SLICE).min(data.len())))
        .collect();

    let mut sent = 0u64;
    let stream = stream::iter(slices).map(move |slice| {
        sent += slice.len() as u64;
        on_progress(sent);
        Ok::<_, std::io::Error>(slice)
    });

    reqwest::Body::wrap_stream(stream)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let summary = request.summary();
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(form) => builder.multipart(to_multipart(form)?),
            RequestBody::Bytes(data) => builder
                .header(CONTENT_LENGTH, data.len())
                .body(progress_body(data, request.on_upload_progress)),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_lowercase(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
            request: summary,
        })
    }
}
