// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of finished traces to a collector.

use crate::trace::Trace;

pub mod daemon;

/// Consumes a finished, sampled trace.
///
/// Fire and forget: implementations own the transport entirely and must
/// never surface transport failures to the traced application. A submitter
/// is invoked at most once per sampled trace and never for unsampled ones.
pub trait SegmentSubmitter {
    fn submit_segment(&self, trace: &Trace);
}
