// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace roots.
//!
//! A [`Trace`] is the root [`Segment`] of one unit of work plus the
//! trace-scoped concerns: seeding from an inbound propagation header,
//! trace-identifier generation, the one-shot sampling decision and the
//! trace-only document fields (`http`, `service`, `user`).

use std::ops::{Deref, DerefMut};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::header::TraceHeader;
use crate::http::Http;
use crate::ids::TraceId;
use crate::sampling;
use crate::segment::{is_absent_or_empty, Segment};
use crate::submission::SegmentSubmitter;

/// The root segment of a request's full call tree.
///
/// A trace carries no internal synchronization and is meant to be driven by
/// a single logical flow of control. Create one per concurrent unit of work
/// (one per request, task, ...) and thread it through the call chain; do
/// not share one instance across tasks.
#[derive(Debug, Default, Serialize)]
pub struct Trace {
    #[serde(flatten)]
    segment: Segment,
    #[serde(skip_serializing_if = "skip_http")]
    http: Option<Http>,
    #[serde(
        rename = "service",
        skip_serializing_if = "is_absent_or_empty",
        serialize_with = "serialize_service"
    )]
    service_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl Trace {
    /// Create a fresh, unstarted, unsampled trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed trace identity from an inbound propagation header.
    ///
    /// Only keys present in the header take effect: `Root` becomes the
    /// trace identifier as-is, `Parent` marks this trace as a continuation
    /// of a remote segment, and a truthy `Sampled` force-enables sampling
    /// ahead of the decision in [`Trace::begin`]. `None` leaves everything
    /// at defaults.
    pub fn set_trace_header(&mut self, header: Option<&str>) -> &mut Self {
        let Some(header) = header else {
            return self;
        };

        let parsed = TraceHeader::parse(header);

        if let Some(root) = parsed.root {
            self.segment.set_trace_id(TraceId::new(root));
        }
        if let Some(parent) = parsed.parent {
            self.segment.set_parent_id(parent);
        }
        if parsed.sampled.unwrap_or(false) {
            self.segment.set_sampled(true);
        }

        self
    }

    /// Open the trace: record the start timestamp, generate a trace
    /// identifier if none was propagated, and make the sampling decision.
    ///
    /// The decision is made exactly once. A trace force-sampled through the
    /// inbound header stays sampled regardless of `sample_percentage`, and
    /// every subsegment attached from here on inherits the outcome.
    pub fn begin(&mut self, sample_percentage: u8) -> &mut Self {
        self.segment.begin();

        if self.segment.trace_id().is_none() {
            let start_time = self.segment.start_time().unwrap_or_default();
            self.segment.set_trace_id(TraceId::generate(start_time));
        }

        if !self.segment.is_sampled() {
            self.segment.set_sampled(sampling::decide(sample_percentage));
        }

        self
    }

    pub fn set_service_version(&mut self, service_version: impl Into<String>) -> &mut Self {
        self.service_version = Some(service_version.into());
        self
    }

    pub fn set_user(&mut self, user: impl Into<String>) -> &mut Self {
        self.user = Some(user.into());
        self
    }

    /// Replace the HTTP metadata wholesale.
    pub fn set_http(&mut self, http: Http) -> &mut Self {
        self.http = Some(http);
        self
    }

    /// HTTP metadata, created empty on first access.
    pub fn http_mut(&mut self) -> &mut Http {
        self.http.get_or_insert_with(Http::default)
    }

    pub fn set_client_ip(&mut self, client_ip: impl Into<String>) -> &mut Self {
        self.http_mut().request.client_ip = Some(client_ip.into());
        self
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> &mut Self {
        self.http_mut().request.user_agent = Some(user_agent.into());
        self
    }

    /// Render the propagation header for downstream services.
    ///
    /// The root segment's identifier is advertised as `Parent`, so the
    /// downstream trace hangs off this trace as a whole.
    pub fn propagation_header(&self) -> TraceHeader {
        TraceHeader {
            root: self.segment.trace_id().map(TraceId::to_string),
            parent: Some(self.segment.id().to_string()),
            sampled: Some(self.segment.is_sampled()),
        }
    }

    /// Hand the finished trace to a submitter, if and only if it was
    /// sampled. Unsampled traces never reach the submitter.
    pub fn submit(&self, submitter: &dyn SegmentSubmitter) {
        if !self.segment.is_sampled() {
            return;
        }

        submitter.submit_segment(self);
    }
}

impl Deref for Trace {
    type Target = Segment;

    fn deref(&self) -> &Segment {
        &self.segment
    }
}

impl DerefMut for Trace {
    fn deref_mut(&mut self) -> &mut Segment {
        &mut self.segment
    }
}

fn skip_http(http: &Option<Http>) -> bool {
    http.as_ref().map_or(true, Http::is_empty)
}

fn serialize_service<S: Serializer>(
    version: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry("version", version.as_deref().unwrap_or_default())?;
    map.end()
}
