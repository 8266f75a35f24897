// Read-only cloud collections: inputs and sensors.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::cloud::CloudClient;
use crate::cloud::outputs::filter_query;
use crate::error::Error;
use crate::models::{Input, Sensor};

/// A list/get-only resource under the current installation.
pub struct Collection<'a, T> {
    client: &'a CloudClient,
    resource: &'static str,
    _record: PhantomData<fn() -> T>,
}

/// `client.inputs()`
pub type Inputs<'a> = Collection<'a, Input>;

/// `client.sensors()`
pub type Sensors<'a> = Collection<'a, Sensor>;

impl<'a, T: DeserializeOwned> Collection<'a, T> {
    pub(crate) fn new(client: &'a CloudClient, resource: &'static str) -> Self {
        Self {
            client,
            resource,
            _record: PhantomData,
        }
    }

    /// `GET .../{resource}?filter=...`
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<T>, Error> {
        let path = self
            .client
            .installation_path(&format!("/{}", self.resource))?;
        self.client.get_data(&path, &filter_query(filter)).await
    }

    /// `GET .../{resource}/{id}`
    pub async fn get(&self, id: u64) -> Result<T, Error> {
        let path = self
            .client
            .installation_path(&format!("/{}/{id}", self.resource))?;
        self.client.get_data(&path, &[]).await
    }
}
