// Local group actions

use tracing::debug;

use crate::engine::Payload;
use crate::error::Error;
use crate::local::LocalGateway;
use crate::local::normalize;
use crate::models::GroupAction;

/// `gateway.groupactions()`
pub struct GroupActions<'a> {
    gateway: &'a LocalGateway,
}

impl<'a> GroupActions<'a> {
    pub(crate) fn new(gateway: &'a LocalGateway) -> Self {
        Self { gateway }
    }

    /// Group action configurations. These are read fresh on every call.
    pub async fn list(&self) -> Result<Vec<GroupAction>, Error> {
        let configs = self
            .gateway
            .action_field("get_group_action_configurations", "config")
            .await?;
        Ok(configs
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(normalize::group_action)
            .collect())
    }

    pub async fn get(&self, id: u64) -> Result<Option<GroupAction>, Error> {
        Ok(self.list().await?.into_iter().find(|g| g.id == id))
    }

    pub async fn trigger(&self, id: u64) -> Result<Payload, Error> {
        debug!(id, "triggering group action");
        self.gateway
            .exec_action("do_group_action", &[("group_action_id", id.to_string())])
            .await
    }

    /// The gateway has no usage field; group actions are matched on their
    /// name instead.
    pub async fn by_usage(&self, usage: &str) -> Result<Vec<GroupAction>, Error> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|g| g.name == usage)
            .collect())
    }

    pub async fn scenes(&self) -> Result<Vec<GroupAction>, Error> {
        self.by_usage("SCENE").await
    }
}
