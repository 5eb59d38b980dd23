use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::parameter::{ParamValue, Parameters};

/// Random uids are drawn from `1..MAX_UID`.
pub const MAX_UID: u32 = 1000;

/// A single neuron: an immutable uid plus a bag of mutable parameters
/// (threshold, leak, ...). Within one network the uid is the neuron's
/// identity; two neurons with the same uid never coexist in a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    pub uid: u32,
    pub parameters: Parameters,
}

impl Neuron {
    pub fn new(uid: u32) -> Self {
        Self {
            uid,
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameters(uid: u32, parameters: Parameters) -> Self {
        Self { uid, parameters }
    }

    /// Create a neuron with a uniformly drawn uid from `1..MAX_UID` that is
    /// not in `exclude`.
    pub fn with_random_uid(exclude: &[u32], parameters: Parameters, rng: &mut impl Rng) -> Self {
        let candidates: Vec<u32> = (1..MAX_UID).filter(|uid| !exclude.contains(uid)).collect();
        assert!(!candidates.is_empty(), "no free neuron uid below {MAX_UID}");
        let uid = candidates[rng.gen_range(0..candidates.len())];
        Self { uid, parameters }
    }

    pub fn threshold(&self) -> Option<&ParamValue> {
        self.parameters.get("threshold")
    }

    pub fn leak(&self) -> Option<&ParamValue> {
        self.parameters.get("leak")
    }
}
