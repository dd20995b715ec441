// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Builds and ships [AWS X-Ray](https://aws.amazon.com/xray/) segment
//! documents from request-handling code.
//!
//! A [`Trace`] is the root of one request's segment tree. It is seeded from
//! the inbound propagation header (or generates its own identity), makes a
//! one-shot sampling decision when it begins, and collects nested
//! [`Segment`]s as work proceeds. When the work is done the trace is handed
//! to a [`SegmentSubmitter`]; sampled traces are serialized to the X-Ray
//! JSON document format and shipped, unsampled ones go nowhere.
//!
//! Tracing is best effort throughout: attaching to a closed segment,
//! malformed header tokens and transport failures are all swallowed, never
//! surfaced to the traced application. The one exception is entropy: call
//! [`entropy::init`] at startup so a missing secure random source fails
//! loudly before any trace is built.
//!
//! A trace has no internal synchronization. Create one per concurrent unit
//! of work and thread it through the call chain explicitly.
//!
//! ```
//! use xray_segment::{DaemonSubmitter, Segment, Trace};
//!
//! # fn main() -> anyhow::Result<()> {
//! xray_segment::entropy::init()?;
//! let submitter = DaemonSubmitter::from_env()?;
//!
//! let mut trace = Trace::new();
//! trace.set_trace_header(None);
//! trace.set_name("my-service");
//! trace.begin(10);
//!
//! let mut query = Segment::new();
//! query.set_name("SELECT session");
//! query.begin();
//! trace.add_subsegment(query);
//!
//! // ... the query runs ...
//!
//! trace.current_mut().end();
//! trace.end();
//! trace.submit(&submitter);
//! # Ok(())
//! # }
//! ```

pub mod entropy;
pub mod header;
pub mod http;
pub mod ids;
pub mod sampling;
pub mod segment;
pub mod submission;
pub mod trace;

pub use crate::entropy::EntropySource;
pub use crate::header::TraceHeader;
pub use crate::http::Http;
pub use crate::ids::{SegmentId, TraceId};
pub use crate::sampling::DEFAULT_SAMPLE_PERCENTAGE;
pub use crate::segment::Segment;
pub use crate::submission::daemon::DaemonSubmitter;
pub use crate::submission::SegmentSubmitter;
pub use crate::trace::Trace;
