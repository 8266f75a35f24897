// Cloud installation endpoints
//
// Installation listing is account-scoped rather than installation-scoped,
// so these paths do not need a current installation.

use tracing::debug;

use crate::cloud::CloudClient;
use crate::cloud::outputs::filter_query;
use crate::error::Error;
use crate::models::Installation;

/// `client.installations()`
pub struct Installations<'a> {
    client: &'a CloudClient,
}

impl<'a> Installations<'a> {
    pub(crate) fn new(client: &'a CloudClient) -> Self {
        Self { client }
    }

    /// All installations visible to the token.
    ///
    /// `GET /base/installations?filter=...`
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<Installation>, Error> {
        debug!(?filter, "listing installations");
        self.client
            .get_data("/base/installations", &filter_query(filter))
            .await
    }

    /// `GET /base/installations/{id}`
    pub async fn get(&self, id: u64) -> Result<Installation, Error> {
        self.client
            .get_data(&format!("/base/installations/{id}"), &[])
            .await
    }
}
