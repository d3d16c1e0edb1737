//! Partial parameter updates for the typed parameter records.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::GraphError;
use crate::model::{FilterKind, NodeParams, Waveform};

/// Field name -> new value, as sent by the parameter form.
pub type ParamPatch = Map<String, Value>;

fn invalid(field: &str, reason: impl Into<String>) -> GraphError {
    GraphError::InvalidParameter {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn choice<T: DeserializeOwned>(field: &str, value: &Value, names: &[&str]) -> Result<T, GraphError> {
    serde_json::from_value(value.clone())
        .map_err(|_| invalid(field, format!("expected one of {}", names.join(", "))))
}

fn number(field: &str, value: &Value) -> Result<f64, GraphError> {
    let n = value
        .as_f64()
        .ok_or_else(|| invalid(field, "expected a number"))?;
    if !n.is_finite() {
        return Err(invalid(field, "must be finite"));
    }
    Ok(n)
}

fn positive(field: &str, value: &Value) -> Result<f64, GraphError> {
    let n = number(field, value)?;
    if n <= 0.0 {
        return Err(invalid(field, "must be greater than 0"));
    }
    Ok(n)
}

fn unit_interval(field: &str, value: &Value) -> Result<f64, GraphError> {
    let n = number(field, value)?;
    if !(0.0..=1.0).contains(&n) {
        return Err(invalid(field, "must be between 0 and 1"));
    }
    Ok(n)
}

impl NodeParams {
    /// Merges `patch` into the record. All fields are checked before any is
    /// written, so a rejected patch leaves the record untouched.
    pub fn apply_patch(&mut self, patch: &ParamPatch) -> Result<(), GraphError> {
        let mut next = self.clone();
        let kind = next.kind();

        for (field, value) in patch {
            match (&mut next, field.as_str()) {
                (NodeParams::Oscillator(osc), "waveform") => {
                    let names: Vec<_> = Waveform::ALL.iter().map(|w| w.name()).collect();
                    osc.waveform = choice(field, value, &names)?;
                }
                (NodeParams::Oscillator(osc), "frequency") => {
                    osc.frequency = positive(field, value)?;
                }
                (NodeParams::Oscillator(osc), "amplitude") => {
                    osc.amplitude = unit_interval(field, value)?;
                }
                (NodeParams::Filter(filter), "type") => {
                    let names: Vec<_> = FilterKind::ALL.iter().map(|k| k.name()).collect();
                    filter.filter_type = choice(field, value, &names)?;
                }
                (NodeParams::Filter(filter), "cutoff") => {
                    filter.cutoff = positive(field, value)?;
                }
                _ => return Err(invalid(field, format!("not a parameter of {}", kind))),
            }
        }

        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterParams, NodeKind, OscillatorParams};
    use serde_json::json;

    fn patch(value: Value) -> ParamPatch {
        value.as_object().cloned().expect("patch must be an object")
    }

    #[test]
    fn merges_only_given_fields() {
        let mut params = NodeParams::default_for(NodeKind::Oscillator);
        params
            .apply_patch(&patch(json!({ "waveform": "Sawtooth", "frequency": 220 })))
            .unwrap();
        assert_eq!(
            params,
            NodeParams::Oscillator(OscillatorParams {
                waveform: Waveform::Sawtooth,
                frequency: 220.0,
                amplitude: 0.5,
            })
        );
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut params = NodeParams::default_for(NodeKind::Filter);
        let before = params.clone();
        params.apply_patch(&ParamPatch::new()).unwrap();
        assert_eq!(params, before);
    }

    #[test]
    fn rejects_fields_from_another_kind() {
        let mut params = NodeParams::default_for(NodeKind::Filter);
        let err = params
            .apply_patch(&patch(json!({ "waveform": "Sine" })))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter { ref field, .. } if field == "waveform"));

        let mut output = NodeParams::default_for(NodeKind::GraphOutput);
        assert!(output.apply_patch(&patch(json!({ "gain": 1 }))).is_err());
    }

    #[test]
    fn rejected_patch_leaves_record_untouched() {
        let mut params = NodeParams::default_for(NodeKind::Filter);
        let err = params.apply_patch(&patch(json!({ "type": "Highpass", "cutoff": -5 })));
        assert!(err.is_err());
        assert_eq!(params, NodeParams::Filter(FilterParams::default()));
    }

    #[test]
    fn validates_ranges_and_choices() {
        let mut params = NodeParams::default_for(NodeKind::Oscillator);
        assert!(params.apply_patch(&patch(json!({ "amplitude": 1.5 }))).is_err());
        assert!(params.apply_patch(&patch(json!({ "frequency": 0 }))).is_err());
        assert!(params.apply_patch(&patch(json!({ "frequency": "440" }))).is_err());
        assert!(params.apply_patch(&patch(json!({ "waveform": "Noise" }))).is_err());
        assert!(params.apply_patch(&patch(json!({ "amplitude": 1.0 }))).is_ok());
    }
}
