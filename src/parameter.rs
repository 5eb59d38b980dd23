//! Tagged parameter values and the sampling specs that generate them.
//!
//! Neurons and synapses carry a mapping from parameter name to [`ParamValue`].
//! Which parameters exist, and how fresh values are drawn for them, is
//! described by [`ParameterSpec`] entries in the mutator configuration.

use std::collections::BTreeMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single neuron or synapse parameter value.
///
/// Equality is exact: `Int(5)` and `Float(5.0)` are different values, both
/// for edit-distance matching and for the structural fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing ".0", so Int(5) and Float(5.0)
            // render to different labels.
            ParamValue::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// Parameter name -> value, sorted by name for deterministic iteration.
pub type Parameters = BTreeMap<String, ParamValue>;

/// Describes how a value for one parameter is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterSpec {
    RandomInt { min: i64, max: i64 },
    RandomBool,
    RandomChoice { values: Vec<ParamValue> },
    Fixed { value: ParamValue },
}

impl ParameterSpec {
    /// Draw a fresh value according to this spec.
    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match self {
            ParameterSpec::RandomInt { min, max } => {
                ParamValue::Int(rng.gen_range(*min..=(*max).max(*min)))
            }
            ParameterSpec::RandomBool => ParamValue::Bool(rng.gen::<bool>()),
            ParameterSpec::RandomChoice { values } => values
                .choose(rng)
                .cloned()
                .unwrap_or(ParamValue::Int(0)),
            ParameterSpec::Fixed { value } => value.clone(),
        }
    }

    /// Fixed-value specs are excluded from parameter mutation.
    pub fn is_mutable(&self) -> bool {
        !matches!(self, ParameterSpec::Fixed { .. })
    }

    pub fn is_valid(&self) -> bool {
        match self {
            ParameterSpec::RandomInt { min, max } => min <= max,
            ParameterSpec::RandomChoice { values } => !values.is_empty(),
            _ => true,
        }
    }
}

/// Parameter name -> sampling spec, sorted by name.
pub type ParameterSpecs = BTreeMap<String, ParameterSpec>;

/// Draw an initial value for every configured parameter, in name order.
pub fn init_parameter_values(specs: &ParameterSpecs, rng: &mut impl Rng) -> Parameters {
    specs
        .iter()
        .map(|(key, spec)| (key.clone(), spec.sample(rng)))
        .collect()
}

/// Return the mutable (non-fixed) entries of a spec set, in name order.
pub fn mutable_parameters(specs: &ParameterSpecs) -> Vec<(&String, &ParameterSpec)> {
    specs.iter().filter(|(_, spec)| spec.is_mutable()).collect()
}

/// Advisory validation of a spec set: invalid entries are logged and still
/// used, configuration validation is not a hard gate for the operators.
pub fn validate_specs(context: &str, specs: &ParameterSpecs) {
    for (key, spec) in specs {
        if !spec.is_valid() {
            log::warn!("invalid parameter spec for {context}.{key}: {spec:?}");
        }
    }
}

/// Pick an entry by relative weight. Weights do not need to sum to one,
/// selection normalizes by the total.
pub fn pick_weighted<'a, T>(choices: &'a [(T, f64)], rng: &mut impl Rng) -> &'a T {
    assert!(!choices.is_empty(), "pick_weighted on an empty choice list");
    let total: f64 = choices.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return &choices[0].0;
    }
    let mut remaining = rng.gen::<f64>() * total;
    for (value, weight) in choices {
        remaining -= weight.max(0.0);
        if remaining < 0.0 {
            return value;
        }
    }
    &choices[choices.len() - 1].0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn random_int_stays_in_range() {
        let spec = ParameterSpec::RandomInt { min: 0, max: 15 };
        let mut rng = test_rng();
        for _ in 0..200 {
            let value = spec.sample(&mut rng).as_int().unwrap();
            assert!((0..=15).contains(&value));
        }
    }

    #[test]
    fn fixed_is_not_mutable() {
        let spec = ParameterSpec::Fixed {
            value: ParamValue::Int(7),
        };
        assert!(!spec.is_mutable());
        assert_eq!(spec.sample(&mut test_rng()), ParamValue::Int(7));
    }

    #[test]
    fn mutable_parameters_skip_fixed() {
        let mut specs = ParameterSpecs::new();
        specs.insert(
            "threshold".into(),
            ParameterSpec::RandomInt { min: 0, max: 127 },
        );
        specs.insert(
            "leak".into(),
            ParameterSpec::Fixed {
                value: ParamValue::Int(5),
            },
        );
        let mutable = mutable_parameters(&specs);
        assert_eq!(mutable.len(), 1);
        assert_eq!(mutable[0].0, "threshold");
    }

    #[test]
    fn weighted_pick_ignores_zero_weight() {
        let choices = [("a", 0.0), ("b", 1.0)];
        let mut rng = test_rng();
        for _ in 0..50 {
            assert_eq!(*pick_weighted(&choices, &mut rng), "b");
        }
    }

    #[test]
    fn int_and_float_render_differently() {
        assert_eq!(ParamValue::Int(5).to_string(), "5");
        assert_eq!(ParamValue::Float(5.0).to_string(), "5.0");
        assert_ne!(ParamValue::Int(5), ParamValue::Float(5.0));
    }

    #[test]
    fn param_value_json_round_trip() {
        for value in [
            ParamValue::Bool(true),
            ParamValue::Int(42),
            ParamValue::Float(2.5),
        ] {
            let text = serde_json::to_string(&value).unwrap();
            let back: ParamValue = serde_json::from_str(&text).unwrap();
            assert_eq!(value, back);
        }
    }
}
