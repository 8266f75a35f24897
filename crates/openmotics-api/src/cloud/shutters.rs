// Cloud shutter endpoints

use serde_json::{Value, json};
use tracing::debug;

use crate::cloud::CloudClient;
use crate::cloud::outputs::filter_query;
use crate::engine::Payload;
use crate::error::Error;
use crate::models::Shutter;

/// `client.shutters()`
pub struct Shutters<'a> {
    client: &'a CloudClient,
}

impl<'a> Shutters<'a> {
    pub(crate) fn new(client: &'a CloudClient) -> Self {
        Self { client }
    }

    fn path(&self, suffix: &str) -> Result<String, Error> {
        self.client
            .installation_path(&format!("/shutters{suffix}"))
    }

    async fn action(&self, id: u64, action: &str, body: Option<Value>) -> Result<Payload, Error> {
        let path = self.path(&format!("/{id}/{action}"))?;
        debug!(id, action, "shutter action");
        self.client.post(&path, body).await
    }

    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<Shutter>, Error> {
        let path = self.path("")?;
        self.client.get_data(&path, &filter_query(filter)).await
    }

    pub async fn get(&self, id: u64) -> Result<Shutter, Error> {
        let path = self.path(&format!("/{id}"))?;
        self.client.get_data(&path, &[]).await
    }

    /// `POST .../shutters/{id}/open`
    pub async fn move_up(&self, id: u64) -> Result<Payload, Error> {
        self.action(id, "open", None).await
    }

    /// `POST .../shutters/{id}/close`
    pub async fn move_down(&self, id: u64) -> Result<Payload, Error> {
        self.action(id, "close", None).await
    }

    pub async fn stop(&self, id: u64) -> Result<Payload, Error> {
        self.action(id, "stop", None).await
    }

    /// Move to an absolute position, from 0 to the shutter's step count
    /// (exclusive). Not every gateway supports this.
    pub async fn change_position(&self, id: u64, position: i64) -> Result<Payload, Error> {
        self.action(id, "change_position", Some(json!({ "position": position })))
            .await
    }

    pub async fn change_relative_position(&self, id: u64, offset: i64) -> Result<Payload, Error> {
        self.action(id, "change_relative_position", Some(json!({ "offset": offset })))
            .await
    }

    pub async fn lock(&self, id: u64) -> Result<Payload, Error> {
        self.action(id, "lock", None).await
    }

    pub async fn unlock(&self, id: u64) -> Result<Payload, Error> {
        self.action(id, "unlock", None).await
    }

    /// Store `position` as the shutter's preset.
    ///
    /// `POST .../shutters/{id}/preset`
    pub async fn set_preset(&self, id: u64, position: i64) -> Result<Payload, Error> {
        self.action(id, "preset", Some(json!({ "position": position })))
            .await
    }

    /// `POST .../shutters/{id}/move`
    pub async fn move_to_preset(&self, id: u64) -> Result<Payload, Error> {
        self.action(id, "move", None).await
    }
}
