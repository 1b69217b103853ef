// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profiles.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use itinera_core::{Container, DocumentQuery, DocumentStore, ItineraError, PartitionKey, ids};

use crate::sessions::to_internal;
use crate::types::User;

/// Payload for a new user profile.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Map<String, Value>,
}

/// Stores user profiles within a tenant.
#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn DocumentStore>,
}

impl UserStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create (or replace) a profile under a caller-chosen user id.
    pub async fn create(
        &self,
        user_id: &str,
        tenant_id: &str,
        new: NewUser,
    ) -> Result<User, ItineraError> {
        let user = User {
            id: user_id.to_string(),
            user_id: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            name: new.name,
            gender: new.gender,
            age: new.age,
            email: new.email,
            phone: new.phone,
            address: new.address,
            created_at: ids::now_rfc3339(),
        };
        let pk = PartitionKey::user(tenant_id, user_id);
        let doc = serde_json::to_value(&user).map_err(to_internal)?;
        self.store.upsert(Container::Users, &pk, doc).await?;
        info!(user_id, tenant_id, "created user");
        Ok(user)
    }

    /// Lookup by user id within a tenant.
    pub async fn get(&self, user_id: &str, tenant_id: &str) -> Result<Option<User>, ItineraError> {
        let pk = PartitionKey::user(tenant_id, user_id);
        match self.store.read(Container::Users, user_id, &pk).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc).map_err(to_internal)?)),
            None => Ok(None),
        }
    }

    /// All profiles in a tenant, newest first.
    pub async fn list(&self, tenant_id: &str) -> Result<Vec<User>, ItineraError> {
        let docs = self
            .store
            .query(
                Container::Users,
                DocumentQuery::default()
                    .eq("tenantId", tenant_id)
                    .order_desc("createdAt"),
            )
            .await?;
        let mut users = Vec::with_capacity(docs.len());
        for doc in docs {
            users.push(serde_json::from_value(doc).map_err(to_internal)?);
        }
        Ok(users)
    }
}
