// OpenMotics cloud API
//
// `CloudClient` plus one borrowed facade per resource kind. Facades are
// built on demand (`client.outputs()`) and always see the client's live
// token, installation and session.

pub mod client;
pub mod devices;
pub mod groupactions;
pub mod installations;
pub mod outputs;
pub mod shutters;
pub mod thermostats;

pub use client::{CloudClient, CloudClientBuilder, DEFAULT_BASE_URL};
pub use devices::{Collection, Inputs, Sensors};
pub use groupactions::GroupActions;
pub use installations::Installations;
pub use outputs::{Lights, Outputs, Switches};
pub use shutters::Shutters;
pub use thermostats::{ThermostatGroups, ThermostatUnits, Thermostats};

impl CloudClient {
    pub fn installations(&self) -> Installations<'_> {
        Installations::new(self)
    }

    pub fn outputs(&self) -> Outputs<'_> {
        Switches::new(self, "outputs")
    }

    pub fn lights(&self) -> Lights<'_> {
        Switches::new(self, "lights")
    }

    pub fn inputs(&self) -> Inputs<'_> {
        Collection::new(self, "inputs")
    }

    pub fn sensors(&self) -> Sensors<'_> {
        Collection::new(self, "sensors")
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
