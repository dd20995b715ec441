// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One-shot sampling decision, made once per trace and inherited downward.

use rand::Rng;

/// Default share of traces to keep, in percent.
pub const DEFAULT_SAMPLE_PERCENTAGE: u8 = 10;

/// Decide whether to sample, given a percentage in `[0, 100]`.
///
/// Draws a uniform integer in `[0, 99]` and samples iff it falls below
/// `percentage`, so 0 never samples and 100 always does.
pub fn decide(percentage: u8) -> bool {
    rand::thread_rng().gen_range(0..100u8) < percentage
}
