// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trip plans.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde_json::Value;
use tracing::info;

use itinera_core::{Container, DocumentQuery, DocumentStore, ItineraError, PartitionKey};

use crate::sessions::to_internal;
use crate::types::Trip;

/// Payload for a new trip.
#[derive(Debug, Clone)]
pub struct NewTrip {
    /// Scope object; must carry an `id` naming the geo scope.
    pub scope: Value,
    pub dates: Value,
    pub travelers: Vec<String>,
    pub constraints: Value,
    pub days: Vec<Value>,
    pub trip_duration: Option<i64>,
}

/// Stores trip plans, one per user and geographic scope per year.
#[derive(Clone)]
pub struct TripStore {
    store: Arc<dyn DocumentStore>,
}

impl TripStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Trip ids are deterministic: the current year plus a short scope
    /// prefix, so re-planning the same destination updates in place.
    fn trip_id(scope_id: &str) -> String {
        let year = Utc::now().year();
        let prefix: String = scope_id.chars().take(3).collect();
        format!("trip_{year}_{prefix}")
    }

    /// Create (or replace) a trip. Duration defaults to the number of
    /// planned days when not given.
    pub async fn create(
        &self,
        tenant_id: &str,
        user_id: &str,
        new: NewTrip,
    ) -> Result<Trip, ItineraError> {
        let scope_id = new
            .scope
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ItineraError::Query {
                message: "trip scope has no `id` field".to_string(),
                source: None,
            })?
            .to_string();
        let id = Self::trip_id(&scope_id);
        let trip_duration = new
            .trip_duration
            .or_else(|| (!new.days.is_empty()).then_some(new.days.len() as i64));
        let trip = Trip {
            id: id.clone(),
            trip_id: id.clone(),
            user_id: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            scope: new.scope,
            dates: new.dates,
            travelers: new.travelers,
            constraints: new.constraints,
            trip_duration,
            days: new.days,
            status: "planning".to_string(),
        };
        let pk = PartitionKey::trip(tenant_id, user_id, &id);
        let doc = serde_json::to_value(&trip).map_err(to_internal)?;
        self.store.upsert(Container::Trips, &pk, doc).await?;
        info!(trip_id = %id, user_id, ?trip_duration, "created trip");
        Ok(trip)
    }

    /// Lookup by trip id, scoped to tenant and user.
    pub async fn get(
        &self,
        trip_id: &str,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Option<Trip>, ItineraError> {
        let docs = self
            .store
            .query(
                Container::Trips,
                DocumentQuery::default()
                    .eq("tripId", trip_id)
                    .eq("tenantId", tenant_id)
                    .eq("userId", user_id)
                    .top(1),
            )
            .await?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(serde_json::from_value(doc).map_err(to_internal)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itinera_store::SqliteDocumentStore;
    use serde_json::json;

    async fn trips() -> TripStore {
        let store = SqliteDocumentStore::open_in_memory().await.unwrap();
        TripStore::new(Arc::new(store))
    }

    fn new_trip(scope_id: &str, days: Vec<Value>) -> NewTrip {
        NewTrip {
            scope: json!({"id": scope_id, "displayName": "Paris, France"}),
            dates: json!({"start": "2026-09-10", "end": "2026-09-13"}),
            travelers: vec!["u1".into()],
            constraints: json!({"budget": "mid"}),
            days,
            trip_duration: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let trips = trips().await;
        let created = trips
            .create("t1", "u1", new_trip("paris", vec![json!({}), json!({}), json!({})]))
            .await
            .unwrap();
        let year = Utc::now().year();
        assert_eq!(created.trip_id, format!("trip_{year}_par"));
        assert_eq!(created.trip_duration, Some(3));
        assert_eq!(created.status, "planning");

        let fetched = trips.get(&created.trip_id, "t1", "u1").await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn explicit_duration_wins_over_days() {
        let trips = trips().await;
        let created = trips
            .create(
                "t1",
                "u1",
                NewTrip {
                    trip_duration: Some(5),
                    ..new_trip("rome", vec![json!({})])
                },
            )
            .await
            .unwrap();
        assert_eq!(created.trip_duration, Some(5));
    }

    #[tokio::test]
    async fn scope_without_id_is_rejected() {
        let trips = trips().await;
        let err = trips
            .create(
                "t1",
                "u1",
                NewTrip {
                    scope: json!({"displayName": "nowhere"}),
                    ..new_trip("x", vec![])
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ItineraError::Query { .. }));
    }

    #[tokio::test]
    async fn get_is_scoped_to_user() {
        let trips = trips().await;
        let created = trips.create("t1", "u1", new_trip("lisbon", vec![])).await.unwrap();
        assert!(trips.get(&created.trip_id, "t1", "u2").await.unwrap().is_none());
    }
}
