// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job kinds this relay advertises and accepts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub kind: String,
    pub cost: u32,
}

impl Capability {
    pub fn new(kind: impl Into<String>, cost: u32) -> Self {
        Self { kind: kind.into(), cost }
    }
}

/// The advertised capability list, which doubles as the intake filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(Vec<Capability>);

impl CapabilitySet {
    pub fn new(capabilities: Vec<Capability>) -> Self {
        Self(capabilities)
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.0.iter().any(|c| c.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self(vec![
            Capability::new("llm_call", 25),
            Capability::new("agent_plan", 30),
            Capability::new("analyze_file", 20),
        ])
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
