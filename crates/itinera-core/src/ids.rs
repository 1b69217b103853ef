// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document id generation and timestamp formatting.
//!
//! Ids are opaque strings: an entity-kind prefix plus a random 12-hex-char
//! suffix, globally unique without coordination. Timestamps are RFC 3339
//! UTC strings with millisecond precision; lexicographic order equals
//! chronological order, which the stores rely on for `ORDER BY` and expiry.

use chrono::Utc;
use uuid::Uuid;

/// Generate a prefixed document id, e.g. `msg_3fa85f64ab12`.
pub fn prefixed_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &suffix[..12])
}

/// Current UTC time as an RFC 3339 string with millisecond precision,
/// e.g. `2026-01-01T00:00:00.000Z`.
pub fn now_rfc3339() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
