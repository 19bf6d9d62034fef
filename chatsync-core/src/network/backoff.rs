// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reconnect Backoff
//!
//! Bounded exponential backoff with jitter for re-establishing the channel.

use std::time::Duration;

use rand::Rng;

use super::transport::TransportConfig;

/// Reconnect policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    base_delay_ms: u64,
    max_delay_ms: u64,
    max_attempts: u32,
    jitter: f64,
}

impl ReconnectPolicy {
    /// Creates a policy. `jitter` is clamped to `0.0..=1.0`.
    pub fn new(base_delay_ms: u64, max_delay_ms: u64, max_attempts: u32, jitter: f64) -> Self {
        ReconnectPolicy {
            base_delay_ms,
            max_delay_ms: max_delay_ms.max(base_delay_ms),
            max_attempts,
            jitter: jitter.clamp(0.0, 1.0),
        }
    }

    /// Creates the policy described by a transport config.
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(
            config.reconnect_base_delay_ms,
            config.reconnect_max_delay_ms,
            config.max_reconnect_attempts,
            config.reconnect_jitter,
        )
    }

    /// Returns the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if attempt number `attempt` (0-based) may run.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before an attempt without jitter: `base * 2^attempt`, capped.
    pub fn base_delay_for_attempt(&self, attempt: u32) -> u64 {
        let multiplier = 1_u64 << attempt.min(20);
        self.base_delay_ms
            .saturating_mul(multiplier)
            .min(self.max_delay_ms)
    }

    /// Delay before an attempt with jitter applied.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let unit = if self.jitter > 0.0 {
            rand::thread_rng().gen_range(-1.0..=1.0)
        } else {
            0.0
        };
        Duration::from_millis(self.jittered(attempt, unit))
    }

    /// Applies jitter for a unit sample in `-1.0..=1.0`.
    fn jittered(&self, attempt: u32, unit: f64) -> u64 {
        let base = self.base_delay_for_attempt(attempt) as f64;
        let factor = 1.0 + self.jitter * unit.clamp(-1.0, 1.0);
        (base * factor).round().min(self.max_delay_ms as f64) as u64
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&TransportConfig::default())
    }
}
