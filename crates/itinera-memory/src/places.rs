// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The place catalog and its hybrid (exact-filter + vector) search.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use itinera_core::{
    Container, DocumentQuery, DocumentStore, Embedder, ItineraError, PartitionKey, embed_or_none,
};

use crate::sessions::to_internal;
use crate::types::{GeoScope, Place};

/// Optional exact-match filters for a place query.
///
/// `tags` and `dietary` are accepted for forward compatibility but are not
/// yet applied as hard filters.
#[derive(Debug, Clone, Default)]
pub struct PlaceFilters {
    pub place_type: Option<String>,
    pub price_tier: Option<i64>,
    pub tags: Vec<String>,
    pub dietary: Vec<String>,
}

/// Read-mostly catalog of points of interest, keyed by geographic scope.
#[derive(Clone)]
pub struct PlaceCatalog {
    store: Arc<dyn DocumentStore>,
    distance_threshold: f32,
    top_k: usize,
}

impl PlaceCatalog {
    pub fn new(store: Arc<dyn DocumentStore>, distance_threshold: f32, top_k: usize) -> Self {
        Self {
            store,
            distance_threshold,
            top_k,
        }
    }

    /// Geo scope identifiers are stored lowercased; normalize user input
    /// the same way so `"Paris "` and `"paris"` hit the same partition.
    fn normalize_scope(geo_scope_id: &str) -> String {
        geo_scope_id.trim().to_lowercase()
    }

    /// Hybrid search: exact filters narrow the candidate set, then cosine
    /// distance to `query_vector` ranks it, closest first. Candidates
    /// beyond the distance threshold never qualify, so an empty result
    /// genuinely means "nothing close enough".
    ///
    /// Failures propagate: on this path a silently empty result would be
    /// indistinguishable from "no places found", which misleads a planner.
    pub async fn query(
        &self,
        query_vector: Vec<f32>,
        geo_scope_id: &str,
        filters: PlaceFilters,
    ) -> Result<Vec<Place>, ItineraError> {
        let scope = Self::normalize_scope(geo_scope_id);
        if scope.is_empty() {
            return Err(ItineraError::Query {
                message: "place query requires a geo scope".to_string(),
                source: None,
            });
        }
        if query_vector.is_empty() {
            return Err(ItineraError::Query {
                message: "place query requires a non-empty query vector".to_string(),
                source: None,
            });
        }
        if !filters.tags.is_empty() || !filters.dietary.is_empty() {
            // Accepted but not yet applied as hard filters.
            debug!(
                tags = filters.tags.len(),
                dietary = filters.dietary.len(),
                "tag/dietary filters ignored in place ranking"
            );
        }

        let mut query = DocumentQuery::default()
            .within(PartitionKey::geo(&scope))
            .eq("geoScopeId", scope.as_str());
        if let Some(place_type) = &filters.place_type {
            query = query.eq("type", place_type.as_str());
        }
        if let Some(price_tier) = filters.price_tier {
            query = query.eq("priceTier", price_tier);
        }
        query = query
            .rank_by_vector("embedding", query_vector, self.distance_threshold)
            .top(self.top_k);

        let docs = self.store.query(Container::Places, query).await?;
        debug!(scope = %scope, count = docs.len(), "place query ranked");
        let mut places = Vec::with_capacity(docs.len());
        for doc in docs {
            places.push(serde_json::from_value(doc).map_err(to_internal)?);
        }
        Ok(places)
    }

    /// Add or refresh a catalog entry, deriving its embedding from the
    /// descriptive text when one is not already cached in the record.
    pub async fn upsert_place(
        &self,
        embedder: &dyn Embedder,
        mut place: Place,
    ) -> Result<Place, ItineraError> {
        place.geo_scope_id = Self::normalize_scope(&place.geo_scope_id);
        if place.embedding.is_empty() {
            let text = format!("{} {}", place.name, place.description);
            if let Some(embedding) = embed_or_none(embedder, &text).await {
                place.embedding = embedding;
            }
        }
        let pk = PartitionKey::geo(&place.geo_scope_id);
        let doc = serde_json::to_value(&place).map_err(to_internal)?;
        self.store.upsert(Container::Places, &pk, doc).await?;
        info!(place_id = %place.id, scope = %place.geo_scope_id, "upserted place");
        Ok(place)
    }

    /// The distinct geographic scopes present in the catalog, each with a
    /// human-readable display name, sorted by id.
    pub async fn geo_scopes(&self) -> Result<Vec<GeoScope>, ItineraError> {
        let docs = self
            .store
            .query(Container::Places, DocumentQuery::default())
            .await?;
        let mut ids: Vec<String> = docs
            .iter()
            .filter_map(|doc| doc.get("geoScopeId").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids
            .into_iter()
            .map(|id| {
                let display_name = display_name_for(&id);
                GeoScope { id, display_name }
            })
            .collect())
    }
}

/// Curated display names for the catalog's known cities; anything else
/// falls back to title-casing the underscore-separated id.
fn display_name_for(geo_scope_id: &str) -> String {
    const KNOWN: &[(&str, &str)] = &[
        ("abu_dhabi", "Abu Dhabi, UAE"),
        ("amsterdam", "Amsterdam, Netherlands"),
        ("athens", "Athens, Greece"),
        ("auckland", "Auckland, New Zealand"),
        ("bangkok", "Bangkok, Thailand"),
        ("barcelona", "Barcelona, Spain"),
        ("beijing", "Beijing, China"),
        ("berlin", "Berlin, Germany"),
        ("brussels", "Brussels, Belgium"),
        ("budapest", "Budapest, Hungary"),
        ("chicago", "Chicago, USA"),
        ("christchurch", "Christchurch, New Zealand"),
        ("copenhagen", "Copenhagen, Denmark"),
        ("delhi", "Delhi, India"),
        ("dubai", "Dubai, UAE"),
        ("dublin", "Dublin, Ireland"),
        ("edinburgh", "Edinburgh, Scotland"),
        ("frankfurt", "Frankfurt, Germany"),
        ("glasgow", "Glasgow, Scotland"),
        ("hong_kong", "Hong Kong"),
        ("istanbul", "Istanbul, Turkey"),
        ("kuala_lumpur", "Kuala Lumpur, Malaysia"),
        ("lisbon", "Lisbon, Portugal"),
        ("london", "London, UK"),
        ("los_angeles", "Los Angeles, USA"),
        ("madrid", "Madrid, Spain"),
        ("manchester", "Manchester, UK"),
        ("melbourne", "Melbourne, Australia"),
        ("miami", "Miami, USA"),
        ("milan", "Milan, Italy"),
        ("mumbai", "Mumbai, India"),
        ("new_york", "New York, USA"),
        ("osaka", "Osaka, Japan"),
        ("oslo", "Oslo, Norway"),
        ("paris", "Paris, France"),
        ("prague", "Prague, Czech Republic"),
        ("reykjavik", "Reykjavik, Iceland"),
        ("rome", "Rome, Italy"),
        ("san_francisco", "San Francisco, USA"),
        ("seattle", "Seattle, USA"),
        ("seoul", "Seoul, South Korea"),
        ("singapore", "Singapore"),
        ("stockholm", "Stockholm, Sweden"),
        ("sydney", "Sydney, Australia"),
        ("tokyo", "Tokyo, Japan"),
        ("toronto", "Toronto, Canada"),
        ("vancouver", "Vancouver, Canada"),
        ("vienna", "Vienna, Austria"),
        ("zurich", "Zurich, Switzerland"),
    ];
    if let Ok(idx) = KNOWN.binary_search_by_key(&geo_scope_id, |(id, _)| *id) {
        return KNOWN[idx].1.to_string();
    }
    geo_scope_id
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use itinera_store::SqliteDocumentStore;
    use serde_json::json;

    async fn catalog() -> PlaceCatalog {
        let store = SqliteDocumentStore::open_in_memory().await.unwrap();
        PlaceCatalog::new(Arc::new(store), 0.075, 5)
    }

    fn place(id: &str, scope: &str, place_type: &str, embedding: Vec<f32>) -> Place {
        Place {
            id: id.into(),
            geo_scope_id: scope.into(),
            place_type: place_type.into(),
            name: format!("Place {id}"),
            description: "somewhere worth a visit".into(),
            tags: vec![],
            accessibility: vec![],
            hours: json!({}),
            price_tier: 2,
            rating: 4.2,
            embedding,
        }
    }

    struct NullEmbedder;

    #[async_trait::async_trait]
    impl Embedder for NullEmbedder {
        fn dimensions(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ItineraError> {
            Ok(vec![0.5, 0.5])
        }
    }

    #[tokio::test]
    async fn query_normalizes_the_scope() {
        let catalog = catalog().await;
        catalog
            .upsert_place(&NullEmbedder, place("place_1", "paris", "restaurant", vec![1.0, 0.0]))
            .await
            .unwrap();

        let results = catalog
            .query(vec![1.0, 0.0], "Paris ", PlaceFilters::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].geo_scope_id, "paris");
    }

    #[tokio::test]
    async fn query_applies_exact_filters_then_ranks() {
        let catalog = catalog().await;
        catalog
            .upsert_place(&NullEmbedder, place("place_rest", "rome", "restaurant", vec![1.0, 0.0]))
            .await
            .unwrap();
        catalog
            .upsert_place(&NullEmbedder, place("place_museum", "rome", "museum", vec![1.0, 0.0]))
            .await
            .unwrap();
        // Close but in another city.
        catalog
            .upsert_place(&NullEmbedder, place("place_paris", "paris", "restaurant", vec![1.0, 0.0]))
            .await
            .unwrap();

        let results = catalog
            .query(
                vec![1.0, 0.0],
                "rome",
                PlaceFilters {
                    place_type: Some("restaurant".into()),
                    ..PlaceFilters::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "place_rest");
    }

    #[tokio::test]
    async fn price_tier_filters_numerically() {
        let catalog = catalog().await;
        let mut cheap = place("place_cheap", "rome", "restaurant", vec![1.0, 0.0]);
        cheap.price_tier = 1;
        catalog.upsert_place(&NullEmbedder, cheap).await.unwrap();
        let mut pricey = place("place_pricey", "rome", "restaurant", vec![1.0, 0.0]);
        pricey.price_tier = 3;
        catalog.upsert_place(&NullEmbedder, pricey).await.unwrap();

        let results = catalog
            .query(
                vec![1.0, 0.0],
                "rome",
                PlaceFilters {
                    price_tier: Some(3),
                    ..PlaceFilters::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "place_pricey");
        assert_eq!(results[0].price_tier, 3);
    }

    #[tokio::test]
    async fn distant_places_never_qualify() {
        let catalog = catalog().await;
        catalog
            .upsert_place(&NullEmbedder, place("place_far", "rome", "restaurant", vec![0.0, 1.0]))
            .await
            .unwrap();
        let results = catalog
            .query(vec![1.0, 0.0], "rome", PlaceFilters::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn empty_vector_and_empty_scope_are_errors() {
        let catalog = catalog().await;
        assert!(matches!(
            catalog.query(vec![], "rome", PlaceFilters::default()).await,
            Err(ItineraError::Query { .. })
        ));
        assert!(matches!(
            catalog.query(vec![1.0], "   ", PlaceFilters::default()).await,
            Err(ItineraError::Query { .. })
        ));
    }

    #[tokio::test]
    async fn upsert_derives_missing_embedding() {
        let catalog = catalog().await;
        let stored = catalog
            .upsert_place(&NullEmbedder, place("place_1", "lisbon", "cafe", vec![]))
            .await
            .unwrap();
        assert_eq!(stored.embedding, vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn geo_scopes_are_distinct_sorted_and_labelled() {
        let catalog = catalog().await;
        for (id, scope) in [
            ("place_1", "paris"),
            ("place_2", "paris"),
            ("place_3", "lisbon"),
            ("place_4", "smallville_east"),
        ] {
            catalog
                .upsert_place(&NullEmbedder, place(id, scope, "cafe", vec![1.0, 0.0]))
                .await
                .unwrap();
        }
        let scopes = catalog.geo_scopes().await.unwrap();
        let ids: Vec<&str> = scopes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["lisbon", "paris", "smallville_east"]);
        assert_eq!(scopes[0].display_name, "Lisbon, Portugal");
        assert_eq!(scopes[1].display_name, "Paris, France");
        // Unknown scopes get title-cased.
        assert_eq!(scopes[2].display_name, "Smallville East");
    }
}
