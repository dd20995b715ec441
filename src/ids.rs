// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Identifier newtypes for segments and traces.

use std::fmt;

use serde::Serialize;

use crate::entropy;

/// A segment identifier: 16 lowercase hex characters from 8 random bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SegmentId(String);

impl SegmentId {
    /// Generate a fresh identifier from the installed entropy source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 8];
        entropy::fill(&mut bytes);
        SegmentId(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A trace identifier in the form `1-<epoch seconds, hex>-<24 hex chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceId(String);

impl TraceId {
    /// Wrap a propagated trace identifier verbatim.
    ///
    /// The shape is deliberately not validated: an upstream service owns
    /// the value and the local trace is a continuation of it.
    pub fn new(value: impl Into<String>) -> Self {
        TraceId(value.into())
    }

    /// Generate a fresh identifier anchored at `start_time`, given as
    /// fractional seconds since the epoch.
    pub fn generate(start_time: f64) -> Self {
        let mut bytes = [0u8; 12];
        entropy::fill(&mut bytes);
        TraceId(format!("1-{:x}-{}", start_time as u64, hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
