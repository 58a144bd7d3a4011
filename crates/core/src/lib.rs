// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jr-core: pure domain of the job relay (documents, prompts, replies,
//! envelopes)

pub mod macros;

pub mod artifact;
pub mod capability;
pub mod clock;
pub mod envelope;
pub mod files;
pub mod id;
pub mod job;
pub mod ledger;
pub mod normalize;
pub mod parse;
pub mod prompt;
pub mod value;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use artifact::{Artifact, ArtifactMeta, ArtifactSet};
pub use capability::{Capability, CapabilitySet};
pub use clock::{rfc3339, Clock, FakeClock, SystemClock};
pub use envelope::{Metrics, Outcome, ResultBody, ResultEnvelope, ResultRefs};
pub use files::{is_job_file_name, is_proposal_file_name, proposal_job_id, result_file_name};
pub use id::{short, JobId, TraceId, WorkerId};
pub use job::{Job, JobDocument, SchemaVersion};
pub use ledger::{ArtifactRef, EventKind, LedgerEntry, Zone};
pub use normalize::{normalize, JobViews, NormalizeError, Normalized};
pub use parse::{parse_reply, JobSpec, LcpReply, ParseResult, ParserConfig, TextReply};
pub use prompt::{build_prompt, Prompt, Template};
