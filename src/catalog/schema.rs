//! Prompt argument schemas.
//!
//! A schema is a small JSON-Schema subset attached to a prompt entry:
//!
//! ```json
//! {
//!   "type": "object",
//!   "properties": {
//!     "scope": { "enum": ["all", "staged", "unstaged"], "default": "all" },
//!     "depth": { "type": "integer", "description": "Review depth" }
//!   },
//!   "required": ["depth"]
//! }
//! ```

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

/// Validated, defaulted arguments ready for rendering.
pub type ArgumentSet = BTreeMap<String, String>;

/// Declared type of a free-form parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ValueType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            Self::String => true,
            Self::Number => value.parse::<f64>().map(f64::is_finite).unwrap_or(false),
            Self::Integer => value.parse::<i64>().is_ok(),
            Self::Boolean => matches!(value, "true" | "false"),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Values a parameter may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    Enumeration(Vec<String>),
    Free(ValueType),
}

impl Domain {
    fn check(&self, name: &str, value: &str) -> Result<()> {
        match self {
            Self::Enumeration(allowed) if !allowed.iter().any(|a| a == value) => {
                Err(Error::Validation(format!(
                    "'{}' must be one of [{}], got '{}'",
                    name,
                    allowed.join(", "),
                    value
                )))
            }
            Self::Free(value_type) if !value_type.accepts(value) => Err(Error::Validation(
                format!("'{}' must be a {}, got '{}'", name, value_type, value),
            )),
            _ => Ok(()),
        }
    }
}

/// One declared prompt parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub description: Option<String>,
    pub domain: Domain,
    pub required: bool,
    pub default: Option<String>,
}

/// Parsed argument schema for one prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSchema {
    parameters: Vec<Parameter>,
}

/// Render a scalar JSON value the way it is substituted into templates.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl ArgumentSchema {
    /// Parse the schema declared for `prompt`. Any defect is a registration error.
    pub fn parse(prompt: &str, schema: &Value) -> Result<Self> {
        let invalid = |reason: String| Error::registration(prompt, reason);

        let object = schema
            .as_object()
            .ok_or_else(|| invalid("schema must be an object".to_string()))?;

        if let Some(kind) = object.get("type") {
            if kind != "object" {
                return Err(invalid(format!("schema type must be 'object', got {}", kind)));
            }
        }

        let empty = Map::new();
        let properties = match object.get("properties") {
            None => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Err(invalid("'properties' must be an object".to_string())),
        };

        let required: Vec<&str> = match object.get("required") {
            None => Vec::new(),
            Some(Value::Array(names)) => names
                .iter()
                .map(|n| {
                    n.as_str()
                        .ok_or_else(|| invalid("'required' must list property names".to_string()))
                })
                .collect::<Result<_>>()?,
            Some(_) => return Err(invalid("'required' must be an array".to_string())),
        };

        if let Some(unknown) = required.iter().find(|r| !properties.contains_key(**r)) {
            return Err(invalid(format!("required property '{}' is not declared", unknown)));
        }

        let mut parameters = properties
            .iter()
            .map(|(name, property)| {
                Self::parse_parameter(name, property, required.contains(&name.as_str()))
                    .map_err(&invalid)
            })
            .collect::<Result<Vec<_>>>()?;
        parameters.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { parameters })
    }

    fn parse_parameter(
        name: &str,
        property: &Value,
        required: bool,
    ) -> std::result::Result<Parameter, String> {
        let property = property
            .as_object()
            .ok_or_else(|| format!("property '{}' must be an object", name))?;

        let domain = match (property.get("enum"), property.get("type")) {
            (Some(Value::Array(values)), _) => {
                if values.is_empty() {
                    return Err(format!("property '{}' has an empty enum", name));
                }
                let allowed = values
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| format!("property '{}' enum values must be scalars", name))?;
                Domain::Enumeration(allowed)
            }
            (Some(_), _) => return Err(format!("property '{}' enum must be an array", name)),
            (None, None) => Domain::Free(ValueType::String),
            (None, Some(kind)) => kind
                .as_str()
                .and_then(ValueType::parse)
                .map(Domain::Free)
                .ok_or_else(|| format!("property '{}' has unsupported type {}", name, kind))?,
        };

        let default = match property.get("default") {
            None => None,
            Some(value) => {
                let default = scalar_to_string(value)
                    .ok_or_else(|| format!("property '{}' default must be a scalar", name))?;
                domain
                    .check(name, &default)
                    .map_err(|_| format!("property '{}' default '{}' is not allowed", name, default))?;
                Some(default)
            }
        };

        let description = property
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);

        Ok(Parameter {
            name: name.to_string(),
            description,
            domain,
            required,
            default,
        })
    }

    /// Declared parameters, ordered by name.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Validate caller arguments and fill in defaults.
    ///
    /// Unknown arguments are ignored. A supplied non-empty value wins over the
    /// default; an empty or null value counts as absent.
    pub fn apply(&self, supplied: &HashMap<String, Value>) -> Result<ArgumentSet> {
        let mut arguments = ArgumentSet::new();

        for parameter in &self.parameters {
            let given = match supplied.get(&parameter.name) {
                None | Some(Value::Null) => None,
                Some(value) => Some(scalar_to_string(value).ok_or_else(|| {
                    Error::Validation(format!("'{}' must be a scalar value", parameter.name))
                })?),
            };

            let value = match given.filter(|v| !v.is_empty()) {
                Some(value) => value,
                None => match &parameter.default {
                    Some(default) => default.clone(),
                    None if parameter.required => {
                        return Err(Error::Validation(format!(
                            "missing required argument '{}'",
                            parameter.name
                        )))
                    }
                    None => continue,
                },
            };

            parameter.domain.check(&parameter.name, &value)?;
            arguments.insert(parameter.name.clone(), value);
        }

        Ok(arguments)
    }
}
