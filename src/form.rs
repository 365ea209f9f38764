//! Editable prediction form and its encoding into a request payload.

use serde::{Serialize, Serializer};

use crate::{
    error::{DashboardError, Result},
    schema::{coerce_number, parse_number, FeatureSchema, FeatureSpec},
};

/// The current value of a form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormValue {
    Numeric(f64),
    Categorical(String),
    /// The feature is neither numeric nor a factor, no default is invented.
    Unset,
}

impl FormValue {
    /// The query string representation, `None` for values that are not sent.
    pub fn to_query(&self) -> Option<String> {
        match self {
            Self::Numeric(n) => Some(format_number(*n)),
            Self::Categorical(level) => Some(level.clone()),
            Self::Unset => None,
        }
    }
}

/// Renders a number the way a browser serializes it into a query string.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n == f64::INFINITY {
        "Infinity".into()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".into()
    } else if n == 0.0 {
        "0".into()
    } else if (1e-6..1e21).contains(&n.abs()) {
        n.to_string()
    } else {
        // Outside that range a browser switches to exponent notation, with an
        // explicit sign on positive exponents.
        let s = format!("{n:e}");
        match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        }
    }
}

/// A feature declaration plus its live value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFormEntry {
    #[serde(flatten)]
    pub spec: FeatureSpec,
    pub value: FormValue,
}

impl FeatureFormEntry {
    fn new(spec: &FeatureSpec) -> Self {
        Self {
            value: default_value(spec),
            spec: spec.clone(),
        }
    }
}

/// Best-guess starting value: the mean for numeric features, the first
/// level for factors, nothing otherwise.
pub fn default_value(spec: &FeatureSpec) -> FormValue {
    if spec.is_numeric() {
        FormValue::Numeric(coerce_number(spec.mean.as_ref()))
    } else if spec.is_factor() {
        spec.levels()
            .first()
            .map_or(FormValue::Unset, |level| FormValue::Categorical(level.clone()))
    } else {
        FormValue::Unset
    }
}

/// Editable form, one entry per schema feature in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureForm {
    entries: Vec<(String, FeatureFormEntry)>,
}

/// Builds an independent form from the schema, injecting default values.
pub fn build_form(schema: &FeatureSchema) -> FeatureForm {
    let entries = schema
        .iter()
        .map(|(name, spec)| (name.to_string(), FeatureFormEntry::new(spec)))
        .collect();

    FeatureForm { entries }
}

impl FeatureForm {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureFormEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn get(&self, name: &str) -> Option<&FeatureFormEntry> {
        self.iter().find(|(n, _)| *n == name).map(|(_, entry)| entry)
    }

    /// Returns the entry at `idx` in display order.
    pub fn get_index(&self, idx: usize) -> Option<(&str, &FeatureFormEntry)> {
        self.entries
            .get(idx)
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut FeatureFormEntry> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, entry)| entry)
            .ok_or_else(|| DashboardError::UnknownFeature(name.to_string()))
    }

    /// Projects every entry's live value into a request payload.
    pub fn encode(&self) -> PredictionRequest {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value.clone()))
            .collect()
    }

    /// Sets a field from user text, coercing it to the feature's type.
    ///
    /// # Errors
    /// `UnknownFeature` if there is no such field, `InvalidInput` if a
    /// numeric field gets text that is not a number. The value is left
    /// unchanged on error.
    pub fn set_text(&mut self, name: &str, text: &str) -> Result<()> {
        let entry = self.entry_mut(name)?;

        if entry.spec.is_numeric() {
            let n = parse_number(text);
            if n.is_nan() {
                return Err(DashboardError::InvalidInput {
                    feature: name.to_string(),
                    msg: format!("'{text}' is not a number"),
                });
            }
            entry.value = FormValue::Numeric(n);
        } else if text.is_empty() && entry.value == FormValue::Unset {
            // nothing typed for a field that never had a value
        } else {
            entry.value = FormValue::Categorical(text.to_string());
        }

        Ok(())
    }

    /// Moves a categorical field `step` positions through its levels,
    /// wrapping around. Fields without levels are left alone.
    pub fn cycle_level(&mut self, name: &str, step: isize) -> Result<()> {
        let entry = self.entry_mut(name)?;
        let levels = entry.spec.levels();
        if levels.is_empty() {
            return Ok(());
        }

        let len = levels.len() as isize;
        let current = match &entry.value {
            FormValue::Categorical(level) => levels.iter().position(|l| l == level),
            _ => None,
        };

        let next = match current {
            Some(idx) => (idx as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };

        entry.value = FormValue::Categorical(levels[next as usize].clone());
        Ok(())
    }

    /// Restores every field to its default value.
    pub fn reset(&mut self) {
        for (_, entry) in self.entries.iter_mut() {
            entry.value = default_value(&entry.spec);
        }
    }
}

impl Serialize for FeatureForm {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Flat feature name to value payload sent to `/predict`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionRequest {
    values: Vec<(String, FormValue)>,
}

impl PredictionRequest {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.iter().find(|(n, _)| *n == name).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Query parameters in form order; unset values are left out.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .filter_map(|(name, value)| value.to_query().map(|v| (name.clone(), v)))
            .collect()
    }
}

impl FromIterator<(String, FormValue)> for PredictionRequest {
    fn from_iter<I: IntoIterator<Item = (String, FormValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Serialize for PredictionRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
