// OpenMotics local gateway API
//
// `LocalGateway` plus borrowed facades mirroring the cloud accessors.
// Every facade call is one or two gateway actions whose payloads are
// normalized into the shared records.

pub mod auth;
pub mod client;
pub mod devices;
pub mod energy;
pub mod groupactions;
pub mod normalize;
pub mod outputs;
pub mod shutters;
pub mod thermostats;

pub use client::{DEFAULT_PORT, LocalGateway, LocalGatewayBuilder};
pub use devices::{Inputs, Sensors};
pub use energy::EnergySensors;
pub use groupactions::GroupActions;
pub use outputs::{Lights, Outputs};
pub use shutters::Shutters;
pub use thermostats::{ThermostatGroups, ThermostatUnits, Thermostats};

impl LocalGateway {
    pub fn outputs(&self) -> Outputs<'_> {
        Outputs::new(self)
    }

    pub fn lights(&self) -> Lights<'_> {
        Lights::new(self)
    }

    pub fn inputs(&self) -> Inputs<'_> {
        Inputs::new(self)
    }

    pub fn sensors(&self) -> Sensors<'_> {
        Sensors::new(self)
    }

    pub fn energysensors(&self) -> EnergySensors<'_> {
        EnergySensors::new(self)
    }

    pub fn shutters(&self) -> Shutters<'_> {
        Shutters::new(self)
    }

    pub fn groupactions(&self) -> GroupActions<'_> {
        GroupActions::new(self)
    }

    pub fn thermostats(&self) -> Thermostats<'_> {
        Thermostats::new(self)
    }
}
