// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace-context propagation header.
//!
//! The wire form is a `;`-separated list of `Key=Value` tokens, e.g.
//! `Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1`.
//! Recognized keys are `Root`, `Parent` and `Sampled`; anything else is
//! ignored.

use std::fmt;

/// Parsed form of the trace propagation header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceHeader {
    pub root: Option<String>,
    pub parent: Option<String>,
    pub sampled: Option<bool>,
}

impl TraceHeader {
    /// Best-effort parse. Tokens without a `=` are skipped and unrecognized
    /// keys are ignored; parsing never fails.
    pub fn parse(header: &str) -> Self {
        let mut parsed = Self::default();

        for token in header.split(';') {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };

            match key {
                "Root" => parsed.root = Some(value.to_string()),
                "Parent" => parsed.parent = Some(value.to_string()),
                "Sampled" => parsed.sampled = Some(truthy(value)),
                _ => (),
            }
        }

        parsed
    }
}

// Empty and "0" are false, anything else is true.
fn truthy(value: &str) -> bool {
    !matches!(value, "" | "0")
}

impl fmt::Display for TraceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";

        if let Some(root) = &self.root {
            write!(f, "Root={root}")?;
            sep = ";";
        }
        if let Some(parent) = &self.parent {
            write!(f, "{sep}Parent={parent}")?;
            sep = ";";
        }
        if let Some(sampled) = self.sampled {
            write!(f, "{sep}Sampled={}", if sampled { "1" } else { "0" })?;
        }

        Ok(())
    }
}
