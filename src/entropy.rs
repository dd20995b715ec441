// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic random source behind segment and trace identifiers.
//!
//! One source serves the whole process. It is installed either explicitly at
//! startup via [`init`] or [`install`], or lazily on first use. Installation
//! probes the source once, so a missing or broken entropy source surfaces as
//! a startup error rather than degrading into malformed identifiers
//! mid-trace.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;
use rand::rngs::OsRng;
use rand::RngCore;

/// A cryptographically strong source of random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `buf` entirely with random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// The operating system entropy source.
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .context("OS entropy source unavailable")
    }
}

static SOURCE: OnceCell<Box<dyn EntropySource>> = OnceCell::new();

/// Probe and install the OS entropy source.
///
/// Call once at startup. Fails if the OS cannot produce random bytes or if
/// a source was already installed.
pub fn init() -> Result<()> {
    install(Box::new(OsEntropy))
}

/// Probe and install a custom entropy source.
pub fn install(source: Box<dyn EntropySource>) -> Result<()> {
    let mut probe = [0u8; 16];
    source
        .fill(&mut probe)
        .context("entropy source failed its startup probe")?;
    SOURCE
        .set(source)
        .map_err(|_| anyhow!("an entropy source is already installed"))
}

pub(crate) fn fill(buf: &mut [u8]) {
    let source = SOURCE.get_or_init(|| Box::new(OsEntropy) as Box<dyn EntropySource>);

    // Failing here means the source broke after a successful probe. Refusing
    // to continue beats emitting empty or constant identifiers.
    source
        .fill(buf)
        .expect("entropy source failed after installation; call entropy::init() at startup to catch this early");
}
