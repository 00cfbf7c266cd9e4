//! Follows, favorites and profiles stored in the hosted backend's tables.
//!
//! Each list lives in a text array column of a row keyed by `user_id`:
//! followed artists in `follows.follow`, followed users in
//! `follows.followed_users`, favorites in `favorites.favorite`. Usernames are
//! written to `users.username`.
//!
//! PostgREST has no array append, so an update reads the row and writes the
//! whole array back. Updates for one owner and list are serialized inside this
//! process.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use turntable_core::{
    Error, MembershipChange, MembershipKind, MembershipList, MembershipRepository,
    MembershipUpdate, ProfileRepository, StorageError,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Table and array column holding one kind of list.
fn location(kind: MembershipKind) -> (&'static str, &'static str) {
    match kind {
        MembershipKind::FollowedArtists => ("follows", "follow"),
        MembershipKind::FollowedUsers => ("follows", "followed_users"),
        MembershipKind::Favorites => ("favorites", "favorite"),
    }
}

pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
    locks: DashMap<(MembershipKind, String), Arc<Mutex<()>>>,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            locks: DashMap::new(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn lock_for(&self, kind: MembershipKind, owner: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry((kind, owner.to_string()))
            .or_default()
            .clone()
    }

    /// The owner's list, or `None` when the owner has no row yet.
    async fn fetch(
        &self,
        kind: MembershipKind,
        owner: &str,
    ) -> Result<Option<MembershipList>, StorageError> {
        let (table, column) = location(kind);
        let request = self
            .request(Method::GET, table)
            .query(&[("select", column.to_string()), ("user_id", format!("eq.{owner}"))]);
        let rows: Vec<Map<String, Value>> = send(request)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::Database(format!("malformed {table} rows: {e}")))?;
        parse_list(rows, column)
    }

    /// Write the owner's list, inserting the row when it does not exist.
    async fn store(
        &self,
        kind: MembershipKind,
        owner: &str,
        list: &MembershipList,
        exists: bool,
    ) -> Result<(), StorageError> {
        let (table, column) = location(kind);
        let request = if exists {
            self.request(Method::PATCH, table)
                .query(&[("user_id", format!("eq.{owner}"))])
                .json(&json!({ column: list }))
        } else {
            self.request(Method::POST, table)
                .json(&json!({ "user_id": owner, column: list }))
        };
        send(request.header("Prefer", "return=minimal")).await?;
        Ok(())
    }
}

async fn send(request: RequestBuilder) -> Result<Response, StorageError> {
    let response = request
        .send()
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: reqwest::StatusCode, body: &str) -> StorageError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    StorageError::Database(format!("{status}: {message}"))
}

/// Read the array `column` out of the rows returned for one owner.
///
/// No row means no list. A `null` column is an empty list.
fn parse_list(
    rows: Vec<Map<String, Value>>,
    column: &str,
) -> Result<Option<MembershipList>, StorageError> {
    let Some(mut row) = rows.into_iter().next() else {
        return Ok(None);
    };

    let ids: Option<Vec<String>> = serde_json::from_value(row.remove(column).unwrap_or_default())
        .map_err(|e| StorageError::Database(format!("malformed {column} column: {e}")))?;
    Ok(Some(MembershipList::from_ids(ids.unwrap_or_default())))
}

#[async_trait]
impl MembershipRepository for PostgrestStore {
    async fn members(&self, kind: MembershipKind, owner: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .fetch(kind, owner)
            .await?
            .map(MembershipList::into_vec)
            .unwrap_or_default())
    }

    async fn add_member(
        &self,
        kind: MembershipKind,
        owner: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error> {
        let lock = self.lock_for(kind, owner);
        let _guard = lock.lock().await;

        let existing = self.fetch(kind, owner).await?;
        let exists = existing.is_some();
        let mut list = existing.unwrap_or_default();

        let change = list.add(id);
        if change == MembershipChange::Added {
            self.store(kind, owner, &list, exists).await?;
        }

        Ok(MembershipUpdate {
            change,
            members: list.into_vec(),
        })
    }

    async fn remove_member(
        &self,
        kind: MembershipKind,
        owner: &str,
        id: &str,
    ) -> Result<MembershipUpdate, Error> {
        let lock = self.lock_for(kind, owner);
        let _guard = lock.lock().await;

        let Some(mut list) = self.fetch(kind, owner).await? else {
            return Ok(MembershipUpdate {
                change: MembershipChange::NotPresent,
                members: Vec::new(),
            });
        };

        let change = list.remove(id);
        if change == MembershipChange::Removed {
            self.store(kind, owner, &list, true).await?;
        }

        Ok(MembershipUpdate {
            change,
            members: list.into_vec(),
        })
    }
}

#[async_trait]
impl ProfileRepository for PostgrestStore {
    async fn set_username(&self, user_id: &str, username: &str) -> Result<(), Error> {
        let now = Utc::now();
        let request = self
            .request(Method::PATCH, "users")
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "username": username, "created_at": now, "updated_at": now }));
        send(request).await?;
        Ok(())
    }
}
