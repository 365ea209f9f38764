//! Input feature schema as declared by the serving process.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    api::INPUT_FEATURES_PATH,
    error::{DashboardError, Result},
    views::display_value,
};

/// Type tags of a feature. The serving process usually sends an array
/// (`["numeric"]`), older ones a bare string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureClass {
    Tags(Vec<String>),
    Text(String),
}

impl FeatureClass {
    /// Membership test for tag arrays, substring test for a bare string.
    pub fn contains(&self, tag: &str) -> bool {
        match self {
            Self::Tags(tags) => tags.iter().any(|t| t == tag),
            Self::Text(text) => text.contains(tag),
        }
    }

    fn from_json(name: &str, raw: Option<Value>) -> Result<Self> {
        match raw {
            None | Some(Value::Null) => Ok(Self::Tags(Vec::new())),
            Some(Value::String(text)) => Ok(Self::Text(text)),
            Some(Value::Array(items)) => Ok(Self::Tags(items.iter().map(display_value).collect())),
            Some(other) => Err(malformed(format!(
                "feature '{name}': class must be a string or an array, got {other}"
            ))),
        }
    }
}

/// Declaration of a single input feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSpec {
    pub class: FeatureClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<String>>,
    /// Attributes the dashboard does not interpret, kept for re-display.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureSpec {
    fn from_json(name: &str, raw: Value) -> Result<Self> {
        let Value::Object(mut attrs) = raw else {
            return Err(malformed(format!("feature '{name}' must be an object")));
        };

        let class = FeatureClass::from_json(name, attrs.remove("class"))?;
        let mean = attrs.remove("mean");
        let levels = match attrs.remove("levels") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(items.iter().map(display_value).collect()),
            Some(scalar) => Some(vec![display_value(&scalar)]),
        };

        Ok(Self {
            class,
            mean,
            levels,
            extra: attrs,
        })
    }

    pub fn is_numeric(&self) -> bool {
        self.class.contains("numeric")
    }

    pub fn is_factor(&self) -> bool {
        self.class.contains("factor")
    }

    /// Valid options for a categorical feature, empty otherwise.
    pub fn levels(&self) -> &[String] {
        self.levels.as_deref().unwrap_or(&[])
    }
}

/// Ordered mapping from feature name to its declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSchema {
    features: Vec<(String, FeatureSpec)>,
}

impl FeatureSchema {
    /// Parses the `/inputFeatures` response body, keeping the server's order.
    ///
    /// # Errors
    /// Returns `Malformed` if the body is not an object of feature objects.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(malformed(format!("expected an object, got {value}")));
        };

        let features = map
            .into_iter()
            .map(|(name, raw)| FeatureSpec::from_json(&name, raw).map(|spec| (name, spec)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { features })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureSpec)> {
        self.features.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn get(&self, name: &str) -> Option<&FeatureSpec> {
        self.iter().find(|(n, _)| *n == name).map(|(_, spec)| spec)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Serialize for FeatureSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Loose numeric coercion, the same a browser applies to a JSON value.
///
/// A missing value is NaN, `null` is 0, a one-element array is its element.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [only] => coerce_number(Some(only)),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

/// Parses decimal text, `Infinity` included. Blank text is 0, anything else NaN.
pub fn parse_number(text: &str) -> f64 {
    match text.trim() {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        t if t
            .bytes()
            .any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E')) =>
        {
            f64::NAN
        }
        t => t.parse().unwrap_or(f64::NAN),
    }
}

fn malformed(msg: String) -> DashboardError {
    DashboardError::Malformed {
        path: INPUT_FEATURES_PATH,
        msg,
    }
}
