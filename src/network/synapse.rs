use serde::{Deserialize, Serialize};

use crate::parameter::{ParamValue, Parameters};

/// A directed 1-1 connection between two neurons, identified by the ordered
/// `(connect_from, connect_to)` uid pair. A network holds at most one
/// synapse per pair. Parameters typically carry weight, delay and whether
/// the synapse is excitatory (`exciting = true`) or inhibitory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    pub connect_from: u32,
    pub connect_to: u32,
    pub parameters: Parameters,
}

impl Synapse {
    pub fn new(connect_from: u32, connect_to: u32) -> Self {
        Self {
            connect_from,
            connect_to,
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameters(connect_from: u32, connect_to: u32, parameters: Parameters) -> Self {
        Self {
            connect_from,
            connect_to,
            parameters,
        }
    }

    /// The ordered endpoint pair that identifies this synapse in a network.
    pub fn key(&self) -> (u32, u32) {
        (self.connect_from, self.connect_to)
    }

    pub fn weight(&self) -> Option<&ParamValue> {
        self.parameters.get("weight")
    }

    pub fn delay(&self) -> Option<&ParamValue> {
        self.parameters.get("delay")
    }

    pub fn exciting(&self) -> Option<&ParamValue> {
        self.parameters.get("exciting")
    }
}
