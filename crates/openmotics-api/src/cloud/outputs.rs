// Cloud output and light endpoints
//
// Lights are exposed by the cloud as their own resource with exactly the
// same action surface as outputs, so both share one facade.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::cloud::CloudClient;
use crate::engine::Payload;
use crate::error::Error;
use crate::models::{Light, Output};

/// Switchable resources under `/base/installations/{id}/{resource}`.
pub struct Switches<'a, T> {
    client: &'a CloudClient,
    resource: &'static str,
    _record: PhantomData<fn() -> T>,
}

/// `client.outputs()`
pub type Outputs<'a> = Switches<'a, Output>;

/// `client.lights()`
pub type Lights<'a> = Switches<'a, Light>;

impl<'a, T: DeserializeOwned> Switches<'a, T> {
    pub(crate) fn new(client: &'a CloudClient, resource: &'static str) -> Self {
        Self {
            client,
            resource,
            _record: PhantomData,
        }
    }

    fn path(&self, suffix: &str) -> Result<String, Error> {
        self.client
            .installation_path(&format!("/{}{suffix}", self.resource))
    }

    /// List all, optionally narrowed by the cloud's `filter` expression.
    ///
    /// `GET .../{resource}?filter=...`
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<T>, Error> {
        let path = self.path("")?;
        debug!(resource = self.resource, ?filter, "listing");
        self.client.get_data(&path, &filter_query(filter)).await
    }

    /// `GET .../{resource}/{id}`
    pub async fn get(&self, id: u64) -> Result<T, Error> {
        let path = self.path(&format!("/{id}"))?;
        self.client.get_data(&path, &[]).await
    }

    /// `POST .../{resource}/{id}/toggle`
    pub async fn toggle(&self, id: u64) -> Result<Payload, Error> {
        let path = self.path(&format!("/{id}/toggle"))?;
        debug!(resource = self.resource, id, "toggling");
        self.client.post(&path, None).await
    }

    /// Turn on, optionally at a dimmer level. The level is clamped to 0..=100.
    ///
    /// `POST .../{resource}/{id}/turn_on` with `{"value": n}`
    pub async fn turn_on(&self, id: u64, value: Option<i64>) -> Result<Payload, Error> {
        let path = self.path(&format!("/{id}/turn_on"))?;
        debug!(resource = self.resource, id, ?value, "turning on");
        self.client.post(&path, Some(turn_on_body(value))).await
    }

    /// Turn off one device, or every device of this kind with `None`.
    ///
    /// `POST .../{resource}/{id}/turn_off` or `POST .../{resource}/turn_off`
    pub async fn turn_off(&self, id: Option<u64>) -> Result<Payload, Error> {
        let path = match id {
            Some(id) => self.path(&format!("/{id}/turn_off"))?,
            None => self.path("/turn_off")?,
        };
        debug!(resource = self.resource, ?id, "turning off");
        self.client.post(&path, None).await
    }
}

pub(crate) fn filter_query(filter: Option<&str>) -> Vec<(&'static str, String)> {
    filter
        .map(|f| vec![("filter", f.to_owned())])
        .unwrap_or_default()
}

fn turn_on_body(value: Option<i64>) -> Value {
    match value {
        Some(v) => json!({ "value": v.clamp(0, 100) }),
        None => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimmer_value_is_clamped() {
        assert_eq!(turn_on_body(Some(150)), json!({"value": 100}));
        assert_eq!(turn_on_body(Some(-5)), json!({"value": 0}));
        assert_eq!(turn_on_body(Some(42)), json!({"value": 42}));
        assert_eq!(turn_on_body(None), json!({}));
    }

    #[test]
    fn filter_becomes_query_parameter() {
        assert!(filter_query(None).is_empty());
        assert_eq!(
            filter_query(Some("usage=LIGHT")),
            vec![("filter", "usage=LIGHT".to_owned())]
        );
    }
}
