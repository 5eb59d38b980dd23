//! Provenance of one individual: how it was produced and from which
//! population indices of the previous generation. Across epochs the
//! `associated_networks` indices form a lineage DAG.

use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ReproductionType {
    #[serde(rename = "mutation")]
    Mutation,
    #[serde(rename = "crossover")]
    Crossover,
    #[serde(rename = "merge")]
    Merge,
    #[serde(rename = "random")]
    Random,
    // Historical document format spells this one capitalized.
    #[serde(rename = "Same")]
    Same,
}

impl fmt::Display for ReproductionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReproductionType::Mutation => write!(f, "mutation"),
            ReproductionType::Crossover => write!(f, "crossover"),
            ReproductionType::Merge => write!(f, "merge"),
            ReproductionType::Random => write!(f, "random"),
            ReproductionType::Same => write!(f, "Same"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Origin {
    pub reproduction_type: ReproductionType,
    /// Indices into the previous generation's population this individual
    /// was derived from. Empty for `Random`; one entry for `Mutation` and
    /// `Same`; two for `Crossover` and `Merge`.
    pub associated_networks: Vec<usize>,
}

impl Origin {
    pub fn new(reproduction_type: ReproductionType, associated_networks: Vec<usize>) -> Self {
        Self {
            reproduction_type,
            associated_networks,
        }
    }
}

// Document form is a pair: ["mutation", [3]].
impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.reproduction_type, &self.associated_networks).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (reproduction_type, associated_networks) =
            <(ReproductionType, Vec<usize>)>::deserialize(deserializer)?;
        Ok(Origin {
            reproduction_type,
            associated_networks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_tagged_pair() {
        let origin = Origin::new(ReproductionType::Crossover, vec![2, 7]);
        let text = serde_json::to_string(&origin).unwrap();
        assert_eq!(text, r#"["crossover",[2,7]]"#);

        let back: Origin = serde_json::from_str(&text).unwrap();
        assert_eq!(back, origin);
    }

    #[test]
    fn same_keeps_its_capital_s() {
        let origin = Origin::new(ReproductionType::Same, vec![0]);
        assert_eq!(serde_json::to_string(&origin).unwrap(), r#"["Same",[0]]"#);
    }
}
