// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational memory and hybrid retrieval for a travel-planning
//! assistant.
//!
//! Multi-tenant sessions, an append-only message log with supersession,
//! rolling summaries, salience-ranked user memories with type-driven
//! decay, and a place catalog searched by exact filters plus vector
//! similarity. All state lives behind the `DocumentStore` trait from
//! `itinera-core`; this crate holds the lifecycle rules.

pub mod diagnostics;
pub mod embedding;
pub mod memories;
pub mod messages;
pub mod places;
pub mod sessions;
pub mod summaries;
pub mod trips;
pub mod types;
pub mod users;

pub use diagnostics::{DiagnosticsStore, NewApiEvent, NewDebugLog};
pub use embedding::HttpEmbedder;
pub use memories::{MemoryStore, NewMemory};
pub use messages::{MessageLog, NewMessage};
pub use places::{PlaceCatalog, PlaceFilters};
pub use sessions::SessionStore;
pub use summaries::SummaryStore;
pub use trips::{NewTrip, TripStore};
pub use types::{
    ApiEvent, AppendReceipt, DebugLog, GeoScope, HandoffOutcome, Memory, MemoryType, Message,
    Place, PropertyEntry, Session, Summary, SummaryReceipt, SummarySpan, Trip, User,
};
pub use users::{NewUser, UserStore};

use std::sync::Arc;

use itinera_config::ItineraConfig;
use itinera_core::DocumentStore;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// All domain stores wired against one document store, with retention and
/// retrieval policy taken from configuration.
#[derive(Clone)]
pub struct Itinera {
    pub sessions: SessionStore,
    pub messages: MessageLog,
    pub summaries: SummaryStore,
    pub memories: MemoryStore,
    pub places: PlaceCatalog,
    pub trips: TripStore,
    pub users: UserStore,
    pub diagnostics: DiagnosticsStore,
}

impl Itinera {
    pub fn new(store: Arc<dyn DocumentStore>, config: &ItineraConfig) -> Self {
        let sessions = SessionStore::new(store.clone());
        let messages = MessageLog::new(store.clone(), sessions.clone());
        let summaries = SummaryStore::new(
            store.clone(),
            config.retrieval.message_retention_days * SECONDS_PER_DAY,
        );
        let memories = MemoryStore::new(
            store.clone(),
            config.retrieval.episodic_ttl_days * SECONDS_PER_DAY,
            config.retrieval.memory_top_k,
        );
        let places = PlaceCatalog::new(
            store.clone(),
            config.retrieval.place_distance_threshold as f32,
            config.retrieval.place_top_k,
        );
        let trips = TripStore::new(store.clone());
        let users = UserStore::new(store.clone());
        let diagnostics = DiagnosticsStore::new(store);
        Self {
            sessions,
            messages,
            summaries,
            memories,
            places,
            trips,
            users,
            diagnostics,
        }
    }
}
