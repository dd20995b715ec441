// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP metadata serialized under a trace document's `http` key.
//!
//! Modeled as an optional composed value rather than a mix-in: the core
//! trace type only reserves the field and delegates population to whatever
//! captured the request.

use serde::Serialize;

/// The `http.request` group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl HttpRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The `http.response` group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
}

impl HttpResponse {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// HTTP request and response metadata for a trace document.
///
/// Empty groups are omitted from the document, and a fully empty value is
/// omitted altogether by [`crate::Trace`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Http {
    #[serde(skip_serializing_if = "HttpRequest::is_empty")]
    pub request: HttpRequest,
    #[serde(skip_serializing_if = "HttpResponse::is_empty")]
    pub response: HttpResponse,
}

impl Http {
    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }
}
