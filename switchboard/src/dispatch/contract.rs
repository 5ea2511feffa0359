//! Declarative action contracts and parameter binding.
//!
//! A contract is the static metadata bound to a handler at registration
//! time: the action token, the named parameter sources, and an optional
//! return-type hint. Contracts are computed once when a handler registers
//! and shared read-only across every dispatch afterwards — there is no
//! runtime reflection; handlers supply the table explicitly.

use crate::error::DispatchError;
use crate::event::EventAction;
use serde_json::Value;

/// Declared kind of a bound parameter.
///
/// Kinds drive coercion at binding time: payload values arriving as JSON
/// strings are coerced to numbers and booleans where the contract asks for
/// them, mirroring how loosely-typed transports deliver query-style data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Accept any JSON value unchanged.
    Any,

    /// A string; numbers and booleans are stringified.
    String,

    /// A signed integer; numeric strings are parsed.
    Integer,

    /// A floating-point number; numeric strings are parsed.
    Number,

    /// A boolean; `"true"`/`"false"` strings are parsed.
    Bool,

    /// A JSON object, passed through unchanged.
    Object,
}

impl ParamKind {
    /// Human-readable name used in binding errors.
    pub fn expects(&self) -> &'static str {
        match self {
            ParamKind::Any => "value",
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Bool => "boolean",
            ParamKind::Object => "object",
        }
    }

    /// Attempt to coerce a payload value to this kind.
    fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            ParamKind::Any => Some(value.clone()),
            ParamKind::String => match value {
                Value::String(_) => Some(value.clone()),
                Value::Number(n) => Some(Value::String(n.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
            ParamKind::Integer => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
                Value::Number(n) => n
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| Value::from(f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
                _ => None,
            },
            ParamKind::Number => match value {
                Value::Number(_) => Some(value.clone()),
                Value::String(s) => s.trim().parse::<f64>().ok().and_then(|f| {
                    serde_json::Number::from_f64(f).map(Value::Number)
                }),
                _ => None,
            },
            ParamKind::Bool => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            ParamKind::Object => match value {
                Value::Object(_) => Some(value.clone()),
                _ => None,
            },
        }
    }
}

/// Declared source of one handler parameter.
///
/// Each parameter is extracted from the incoming payload object by its
/// declared key, with required/optional and default-value rules.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    required: bool,
    default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter. Dispatch fails before invocation when the
    /// payload does not carry it.
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
        }
    }

    /// An optional parameter; binds to JSON `null` when absent.
    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    /// An optional parameter with a default value used when absent.
    pub fn with_default(name: impl Into<String>, kind: ParamKind, default: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: Some(default),
        }
    }

    /// The payload key this parameter binds from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared kind.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }
}

/// Static metadata binding an action token to a handler method.
#[derive(Debug, Clone)]
pub struct ActionContract {
    action: EventAction,
    params: Vec<ParamSpec>,
    returns: Option<String>,
}

impl ActionContract {
    /// Start a contract for an action token.
    pub fn new(action: EventAction) -> Self {
        Self {
            action,
            params: Vec::new(),
            returns: None,
        }
    }

    /// Declare the next parameter. Order here is the order the invoker
    /// receives bound values in.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Attach an optional return-type hint.
    pub fn returns(mut self, hint: impl Into<String>) -> Self {
        self.returns = Some(hint.into());
        self
    }

    /// The action token this contract answers.
    pub fn action(&self) -> &EventAction {
        &self.action
    }

    /// Declared parameters, in binding order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Return-type hint, when declared.
    pub fn return_hint(&self) -> Option<&str> {
        self.returns.as_deref()
    }

    /// Bind declared parameters from an incoming payload.
    ///
    /// # Errors
    ///
    /// - `DispatchError::MissingParameter` when a required parameter is
    ///   absent from the payload (the handler is never invoked)
    /// - `DispatchError::ParameterType` when a value cannot be coerced to
    ///   the declared kind
    pub fn bind(&self, payload: Option<&Value>) -> Result<Vec<Value>, DispatchError> {
        let empty = serde_json::Map::new();
        let fields = payload.and_then(Value::as_object).unwrap_or(&empty);

        let mut bound = Vec::with_capacity(self.params.len());
        for spec in &self.params {
            match fields.get(spec.name()).filter(|v| !v.is_null()) {
                Some(value) => {
                    let coerced = spec.kind.coerce(value).ok_or_else(|| {
                        DispatchError::ParameterType {
                            name: spec.name.clone(),
                            expected: spec.kind.expects(),
                        }
                    })?;
                    bound.push(coerced);
                }
                None => match (&spec.default, spec.required) {
                    (Some(default), _) => bound.push(default.clone()),
                    (None, true) => {
                        return Err(DispatchError::MissingParameter(spec.name.clone()))
                    }
                    (None, false) => bound.push(Value::Null),
                },
            }
        }
        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract() -> ActionContract {
        ActionContract::new(EventAction::Create)
            .param(ParamSpec::required("id", ParamKind::Integer))
            .param(ParamSpec::optional("note", ParamKind::String))
            .param(ParamSpec::with_default("active", ParamKind::Bool, json!(true)))
    }

    #[test]
    fn test_bind_all_present() {
        let payload = json!({"id": 5, "note": "hi", "active": false});
        let bound = contract().bind(Some(&payload)).unwrap();
        assert_eq!(bound, vec![json!(5), json!("hi"), json!(false)]);
    }

    #[test]
    fn test_bind_applies_defaults_and_null() {
        let payload = json!({"id": 5});
        let bound = contract().bind(Some(&payload)).unwrap();
        assert_eq!(bound, vec![json!(5), Value::Null, json!(true)]);
    }

    #[test]
    fn test_bind_missing_required_names_parameter() {
        let payload = json!({"note": "hi"});
        let result = contract().bind(Some(&payload));
        match result {
            Err(DispatchError::MissingParameter(name)) => assert_eq!(name, "id"),
            other => panic!("expected MissingParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_no_payload_fails_required() {
        assert!(matches!(
            contract().bind(None),
            Err(DispatchError::MissingParameter(_))
        ));
    }

    #[test]
    fn test_coerce_string_to_integer() {
        let payload = json!({"id": "42"});
        let bound = ActionContract::new(EventAction::GetOne)
            .param(ParamSpec::required("id", ParamKind::Integer))
            .bind(Some(&payload))
            .unwrap();
        assert_eq!(bound, vec![json!(42)]);
    }

    #[test]
    fn test_coerce_string_to_bool() {
        let payload = json!({"flag": "TRUE"});
        let bound = ActionContract::new(EventAction::Update)
            .param(ParamSpec::required("flag", ParamKind::Bool))
            .bind(Some(&payload))
            .unwrap();
        assert_eq!(bound, vec![json!(true)]);
    }

    #[test]
    fn test_coerce_failure_names_parameter_and_kind() {
        let payload = json!({"id": "not-a-number"});
        let result = ActionContract::new(EventAction::GetOne)
            .param(ParamSpec::required("id", ParamKind::Integer))
            .bind(Some(&payload));
        match result {
            Err(DispatchError::ParameterType { name, expected }) => {
                assert_eq!(name, "id");
                assert_eq!(expected, "integer");
            }
            other => panic!("expected ParameterType, got {:?}", other),
        }
    }

    #[test]
    fn test_coerce_whole_float_to_integer() {
        let payload = json!({"id": 7.0});
        let bound = ActionContract::new(EventAction::GetOne)
            .param(ParamSpec::required("id", ParamKind::Integer))
            .bind(Some(&payload))
            .unwrap();
        assert_eq!(bound, vec![json!(7)]);
    }
}
