// Cloud group action (scene) endpoints

use tracing::debug;

use crate::cloud::CloudClient;
use crate::cloud::outputs::filter_query;
use crate::engine::Payload;
use crate::error::Error;
use crate::models::GroupAction;

/// `client.groupactions()`
pub struct GroupActions<'a> {
    client: &'a CloudClient,
}

impl<'a> GroupActions<'a> {
    pub(crate) fn new(client: &'a CloudClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<GroupAction>, Error> {
        let path = self.client.installation_path("/groupactions")?;
        self.client.get_data(&path, &filter_query(filter)).await
    }

    pub async fn get(&self, id: u64) -> Result<GroupAction, Error> {
        let path = self
            .client
            .installation_path(&format!("/groupactions/{id}"))?;
        self.client.get_data(&path, &[]).await
    }

    /// `POST .../groupactions/{id}/trigger`
    pub async fn trigger(&self, id: u64) -> Result<Payload, Error> {
        let path = self
            .client
            .installation_path(&format!("/groupactions/{id}/trigger"))?;
        debug!(id, "triggering group action");
        self.client.post(&path, None).await
    }

    /// Group actions intended for `usage` (e.g. `SCENE`). The usage is
    /// sent upper-cased.
    ///
    /// `GET .../groupactions?usage=SCENE`
    pub async fn by_usage(&self, usage: &str) -> Result<Vec<GroupAction>, Error> {
        let path = self.client.installation_path("/groupactions")?;
        self.client
            .get_data(&path, &[("usage", usage.to_uppercase())])
            .await
    }

    /// Group actions meant to be used as scenes.
    pub async fn scenes(&self) -> Result<Vec<GroupAction>, Error> {
        self.by_usage("SCENE").await
    }
}
