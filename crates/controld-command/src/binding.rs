//! Generic parameter binding engine.
//!
//! A [`Binding`] turns a table of `(key, kind, closure)` entries into a
//! [`Command`]. Executing it runs the request through fixed phases:
//!
//! 1. **Required**: every [`ParamKind::Required`] key must be present. Its
//!    closure validates the value and stages it in a per-request session
//!    `S`. Nothing touches hardware yet.
//! 2. **Resolve**: the resolver maps the session to the target's
//!    [`Shared`] handle and the engine takes the target's lock.
//! 3. **Mutators**: each [`ParamKind::Mutator`] whose key is present is
//!    applied in declaration order. The first failure stops the command;
//!    earlier mutations stay applied.
//! 4. **Optional**: the single [`ParamKind::Optional`] entry runs if its key
//!    is present.
//! 5. **Accessors**: every [`ParamKind::Accessor`] adds a field to the
//!    response, every [`ParamKind::OptionalAccessor`] only when its
//!    precondition over the session holds.
//!
//! The target lock is held from phase 2 to the end of phase 5, so a request
//! that writes and then reads an object always observes its own write.
//!
//! # Example
//!
//! ```
//! use controld_command::binding::{self, Binding, Command};
//! use controld_core::ErrorCode;
//! use controld_command::response;
//! use serde_json::json;
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Session {
//!     step: u64,
//! }
//!
//! let counter = Arc::new(Mutex::new(0u64));
//! let command = Binding::<Session, u64>::fixed("count", "count {\"step\": <n>}", counter)
//!     .required("step", |session, value| {
//!         session.step = binding::bounded("step", value, 1..=10)?;
//!         Ok(())
//!     })
//!     .mutator("apply", |session, count, value| {
//!         if binding::boolean("apply", value)? {
//!             *count += session.step;
//!         }
//!         Ok(())
//!     })
//!     .accessor("count", |_, count| Ok(json!(*count)));
//!
//! let reply = command.execute(&json!({"step": 3, "apply": true}));
//! assert_eq!(reply, json!({"count": 3, "error": 0}));
//!
//! let reply = command.execute(&json!({"apply": true}));
//! assert_eq!(response::error_code(&reply), Some(ErrorCode::ParamMissing));
//! ```

use crate::response;
use controld_core::{ControlId, Error, Result};
use controld_hardware::{Control, Registry, Shared};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use tracing::{debug, warn};

/// A named operation reachable through the command handler.
pub trait Command: Send + Sync {
    /// Name the command is registered under.
    fn name(&self) -> &str;

    /// One-line usage text shown by `help`.
    fn usage(&self) -> &str;

    /// Run the command and render its response.
    ///
    /// Never fails: every outcome, including errors, is a response object.
    fn execute(&self, params: &Value) -> Value;
}

/// Role of a parameter entry in the execution phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Required,
    Mutator,
    Optional,
    Accessor,
    OptionalAccessor,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ParamKind::Required => "required",
            ParamKind::Mutator => "mutator",
            ParamKind::Optional => "optional",
            ParamKind::Accessor => "accessor",
            ParamKind::OptionalAccessor => "optional accessor",
        };
        f.write_str(name)
    }
}

type Stage<S> = Box<dyn Fn(&mut S, &Value) -> Result<()> + Send + Sync>;
type Mutate<S, T> = Box<dyn Fn(&mut S, &mut T, &Value) -> Result<()> + Send + Sync>;
type Read<S, T> = Box<dyn Fn(&S, &T) -> Result<Value> + Send + Sync>;
type Precondition<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;
type Resolve<S, T> = Box<dyn Fn(&S) -> Result<Shared<T>> + Send + Sync>;

enum Handler<S, T> {
    Required(Stage<S>),
    Mutator(Mutate<S, T>),
    Optional(Mutate<S, T>),
    Accessor(Read<S, T>),
    OptionalAccessor(Precondition<S>, Read<S, T>),
}

impl<S, T> Handler<S, T> {
    fn kind(&self) -> ParamKind {
        match self {
            Handler::Required(_) => ParamKind::Required,
            Handler::Mutator(_) => ParamKind::Mutator,
            Handler::Optional(_) => ParamKind::Optional,
            Handler::Accessor(_) => ParamKind::Accessor,
            Handler::OptionalAccessor(..) => ParamKind::OptionalAccessor,
        }
    }
}

struct Param<S, T> {
    key: &'static str,
    handler: Handler<S, T>,
}

/// A command built from a parameter table.
///
/// `S` is the per-request session filled by the required phase; `T` is the
/// control object the command operates on.
pub struct Binding<S, T> {
    name: String,
    usage: String,
    resolve: Resolve<S, T>,
    params: Vec<Param<S, T>>,
}

impl<S, T> Binding<S, T>
where
    S: Default,
    T: Send + 'static,
{
    /// Create a command whose target is chosen from the session.
    pub fn new(
        name: impl Into<String>,
        usage: impl Into<String>,
        resolve: impl Fn(&S) -> Result<Shared<T>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            usage: usage.into(),
            resolve: Box::new(resolve),
            params: Vec::new(),
        }
    }

    /// Create a command bound to a single target.
    pub fn fixed(name: impl Into<String>, usage: impl Into<String>, target: Shared<T>) -> Self {
        Self::new(name, usage, move |_| Ok(target.clone()))
    }

    fn push(mut self, key: &'static str, handler: Handler<S, T>) -> Self {
        self.params.push(Param { key, handler });
        self
    }

    /// Add a required parameter. The closure may only validate and stage.
    pub fn required(
        self,
        key: &'static str,
        stage: impl Fn(&mut S, &Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.push(key, Handler::Required(Box::new(stage)))
    }

    /// Add a parameter that writes to the target when present.
    pub fn mutator(
        self,
        key: &'static str,
        mutate: impl Fn(&mut S, &mut T, &Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.push(key, Handler::Mutator(Box::new(mutate)))
    }

    /// Set the single optional parameter, replacing any earlier one.
    pub fn optional(
        mut self,
        key: &'static str,
        apply: impl Fn(&mut S, &mut T, &Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.params
            .retain(|param| param.handler.kind() != ParamKind::Optional);
        self.push(key, Handler::Optional(Box::new(apply)))
    }

    /// Add a field that is always reported.
    pub fn accessor(
        self,
        key: &'static str,
        read: impl Fn(&S, &T) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.push(key, Handler::Accessor(Box::new(read)))
    }

    /// Add a field reported only when `when` holds for the session.
    pub fn optional_accessor(
        self,
        key: &'static str,
        when: impl Fn(&S) -> bool + Send + Sync + 'static,
        read: impl Fn(&S, &T) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.push(
            key,
            Handler::OptionalAccessor(Box::new(when), Box::new(read)),
        )
    }

    /// Declared parameters in declaration order.
    pub fn params(&self) -> impl Iterator<Item = (&'static str, ParamKind)> + '_ {
        self.params
            .iter()
            .map(|param| (param.key, param.handler.kind()))
    }

    /// Run every phase and collect the accessor fields.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any phase.
    pub fn run(&self, params: &Value) -> Result<Map<String, Value>> {
        let empty = Map::new();
        let request = match params {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(Error::syntax(format!(
                    "parameters must be a JSON object, got {}",
                    json_type(other)
                )));
            }
        };

        let mut session = S::default();
        for param in &self.params {
            if let Handler::Required(stage) = &param.handler {
                let value = request
                    .get(param.key)
                    .ok_or_else(|| Error::param_missing(param.key))?;
                stage(&mut session, value)?;
            }
        }

        let target = (self.resolve)(&session)?;
        let mut guard = target
            .lock()
            .map_err(|_| Error::cmd_failed(format!("{}: target lock poisoned", self.name)))?;
        let object = &mut *guard;

        for param in &self.params {
            if let Handler::Mutator(mutate) = &param.handler
                && let Some(value) = request.get(param.key)
            {
                mutate(&mut session, object, value)?;
            }
        }

        for param in &self.params {
            if let Handler::Optional(apply) = &param.handler
                && let Some(value) = request.get(param.key)
            {
                apply(&mut session, object, value)?;
            }
        }

        let mut fields = Map::new();
        for param in &self.params {
            match &param.handler {
                Handler::Accessor(read) => {
                    fields.insert(param.key.to_string(), read(&session, object)?);
                }
                Handler::OptionalAccessor(when, read) if when(&session) => {
                    fields.insert(param.key.to_string(), read(&session, object)?);
                }
                _ => {}
            }
        }
        Ok(fields)
    }
}

impl<S, T> Command for Binding<S, T>
where
    S: Default,
    T: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn usage(&self) -> &str {
        &self.usage
    }

    fn execute(&self, params: &Value) -> Value {
        debug!(command = %self.name, "executing");
        let outcome = self.run(params);
        if let Err(e) = &outcome {
            warn!(
                command = %self.name,
                code = %e.code(),
                detail = e.detail(),
                "command failed"
            );
        }
        response::render(outcome)
    }
}

impl<S, T> fmt::Debug for Binding<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field(
                "params",
                &self
                    .params
                    .iter()
                    .map(|param| (param.key, param.handler.kind()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Value conventions
// ============================================================================

/// Non-negative whole number; `1.0` counts as `1`.
fn whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    })
}

/// Object selector such as `bank` or `led`.
///
/// Non-numbers are `SYNTAX`; negative, fractional or too large numbers are
/// `PARAM_OUT_OF_RANGE`. Integral floats such as `1.0` are accepted.
pub fn selector(key: &str, value: &Value) -> Result<ControlId> {
    if !value.is_number() {
        return Err(Error::syntax(format!(
            "{key}: expected a number, got {}",
            json_type(value)
        )));
    }
    let id = whole_number(value)
        .ok_or_else(|| Error::out_of_range(format!("{key}: {value} is not a valid id")))?;
    ControlId::try_from(id)
}

/// Strict boolean: only `true` and `false` are accepted.
pub fn boolean(key: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        Error::syntax(format!(
            "{key}: expected a boolean, got {}",
            json_type(value)
        ))
    })
}

pub fn string<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        Error::syntax(format!("{key}: expected a string, got {}", json_type(value)))
    })
}

/// A string or an array of strings.
pub fn strings<'a>(key: &str, value: &'a Value) -> Result<Vec<&'a str>> {
    match value {
        Value::String(single) => Ok(vec![single.as_str()]),
        Value::Array(items) => items.iter().map(|item| string(key, item)).collect(),
        other => Err(Error::syntax(format!(
            "{key}: expected a string or an array of strings, got {}",
            json_type(other)
        ))),
    }
}

/// Non-negative integer within `range`.
pub fn bounded(key: &str, value: &Value, range: RangeInclusive<u64>) -> Result<u64> {
    if !value.is_number() {
        return Err(Error::syntax(format!(
            "{key}: expected a number, got {}",
            json_type(value)
        )));
    }
    match whole_number(value) {
        Some(n) if range.contains(&n) => Ok(n),
        _ => Err(Error::out_of_range(format!(
            "{key}: {value} not in {}-{}",
            range.start(),
            range.end()
        ))),
    }
}

/// String matched exactly against a vocabulary through `FromStr`.
pub fn enumerated<E>(key: &str, value: &Value) -> Result<E>
where
    E: FromStr<Err = Error>,
{
    string(key, value)?.parse()
}

/// Look up a registered control object; a miss is `PARAM_OUT_OF_RANGE`.
pub fn lookup<T: Control>(registry: &Registry<T>, id: ControlId) -> Result<Shared<T>> {
    registry
        .get(id)
        .ok_or_else(|| Error::out_of_range(format!("{} {id} not registered", T::KIND)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use controld_core::{Direction, ErrorCode};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Lamp {
        level: u64,
        on: bool,
    }

    #[derive(Default)]
    struct Session {
        lamp: u64,
        label: Option<String>,
    }

    fn lamp_command(lamp: Shared<Lamp>, resolved: Arc<AtomicBool>) -> Binding<Session, Lamp> {
        Binding::new("lamp", "lamp {\"lamp\": 0}", move |session: &Session| {
            resolved.store(true, Ordering::SeqCst);
            if session.lamp == 0 {
                Ok(lamp.clone())
            } else {
                Err(Error::out_of_range(format!("lamp {} not registered", session.lamp)))
            }
        })
        .required("lamp", |session, value| {
            session.lamp = bounded("lamp", value, 0..=3)?;
            Ok(())
        })
        .mutator("on", |_, lamp, value| {
            lamp.on = boolean("on", value)?;
            Ok(())
        })
        .mutator("level", |_, lamp, value| {
            lamp.level = bounded("level", value, 0..=100)?;
            Ok(())
        })
        .optional("label", |session, _, value| {
            session.label = Some(string("label", value)?.to_string());
            Ok(())
        })
        .accessor("on", |_, lamp| Ok(json!(lamp.on)))
        .accessor("level", |_, lamp| Ok(json!(lamp.level)))
        .optional_accessor(
            "label",
            |session| session.label.is_some(),
            |session, _| Ok(json!(session.label)),
        )
    }

    fn fixture() -> (Binding<Session, Lamp>, Shared<Lamp>, Arc<AtomicBool>) {
        let lamp = Arc::new(Mutex::new(Lamp::default()));
        let resolved = Arc::new(AtomicBool::new(false));
        (
            lamp_command(lamp.clone(), resolved.clone()),
            lamp,
            resolved,
        )
    }

    #[test]
    fn test_success_reports_accessors() {
        let (command, lamp, _) = fixture();
        let reply = command.execute(&json!({"lamp": 0, "on": true, "level": 40}));
        assert_eq!(reply, json!({"on": true, "level": 40, "error": 0}));
        assert!(lamp.lock().unwrap().on);
    }

    #[test]
    fn test_missing_required_stops_before_resolve() {
        let (command, lamp, resolved) = fixture();
        let reply = command.execute(&json!({"on": true}));

        assert_eq!(reply, json!({"error": 6, "detail": "lamp"}));
        assert!(!resolved.load(Ordering::SeqCst));
        assert!(!lamp.lock().unwrap().on);
    }

    #[test]
    fn test_invalid_required_stops_before_resolve() {
        let (command, _, resolved) = fixture();
        let reply = command.execute(&json!({"lamp": "zero", "on": true}));
        assert_eq!(response::error_code(&reply), Some(ErrorCode::Syntax));
        assert!(!resolved.load(Ordering::SeqCst));
    }

    #[test]
    fn test_unresolved_target() {
        let (command, lamp, _) = fixture();
        let reply = command.execute(&json!({"lamp": 2, "on": true}));
        assert_eq!(response::error_code(&reply), Some(ErrorCode::ParamOutOfRange));
        assert!(!lamp.lock().unwrap().on);
    }

    #[test]
    fn test_mutators_fail_fast_and_keep_earlier_writes() {
        let (command, lamp, _) = fixture();
        let reply = command.execute(&json!({"lamp": 0, "on": true, "level": 500}));

        assert_eq!(response::error_code(&reply), Some(ErrorCode::ParamOutOfRange));
        assert!(reply.get("on").is_none());
        let lamp = lamp.lock().unwrap();
        assert!(lamp.on);
        assert_eq!(lamp.level, 0);
    }

    #[test]
    fn test_optional_and_optional_accessor() {
        let (command, _, _) = fixture();

        let reply = command.execute(&json!({"lamp": 0}));
        assert!(reply.get("label").is_none());

        let reply = command.execute(&json!({"lamp": 0, "label": "porch"}));
        assert_eq!(reply["label"], json!("porch"));
    }

    #[test]
    fn test_optional_replaces_previous() {
        let (command, _, _) = fixture();
        let command = command.optional("name", |_, _, _| Ok(()));
        let optionals: Vec<_> = command
            .params()
            .filter(|(_, kind)| *kind == ParamKind::Optional)
            .map(|(key, _)| key)
            .collect();
        assert_eq!(optionals, vec!["name"]);
    }

    #[rstest]
    #[case(json!([1, 2]))]
    #[case(json!("lamp"))]
    #[case(json!(3))]
    fn test_non_object_params_rejected(#[case] params: Value) {
        let (command, _, _) = fixture();
        let reply = command.execute(&params);
        assert_eq!(response::error_code(&reply), Some(ErrorCode::Syntax));
    }

    #[test]
    fn test_null_params_are_empty_object() {
        let lamp = Arc::new(Mutex::new(Lamp::default()));
        let command = Binding::<(), Lamp>::fixed("lamp", "lamp", lamp)
            .accessor("on", |_, lamp| Ok(json!(lamp.on)));
        assert_eq!(command.execute(&Value::Null), json!({"on": false, "error": 0}));
    }

    #[test]
    fn test_failing_accessor_drops_all_fields() {
        let lamp = Arc::new(Mutex::new(Lamp::default()));
        let command = Binding::<(), Lamp>::fixed("lamp", "lamp", lamp)
            .accessor("on", |_, lamp| Ok(json!(lamp.on)))
            .accessor("level", |_, _| Err(Error::cmd_failed("register read failed")));

        let reply = command.execute(&json!({}));
        assert_eq!(reply, json!({"error": 4, "detail": "register read failed"}));
    }

    #[test]
    fn test_poisoned_target_is_cmd_failed() {
        let lamp = Arc::new(Mutex::new(Lamp::default()));
        let poisoner = lamp.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        let command = Binding::<(), Lamp>::fixed("lamp", "lamp", lamp);
        let reply = command.execute(&json!({}));
        assert_eq!(response::error_code(&reply), Some(ErrorCode::CmdFailed));
    }

    #[test]
    fn test_params_in_declaration_order() {
        let (command, _, _) = fixture();
        let params: Vec<_> = command.params().collect();
        assert_eq!(params[0], ("lamp", ParamKind::Required));
        assert_eq!(params[1], ("on", ParamKind::Mutator));
        assert_eq!(params.last(), Some(&("label", ParamKind::OptionalAccessor)));
    }

    #[rstest]
    #[case(json!(0), Ok(0))]
    #[case(json!(255), Ok(255))]
    #[case(json!(1.0), Ok(1))]
    #[case(json!(256), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!(-1), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!(-1.0), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!(1.5), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!(256.0), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!("1"), Err(ErrorCode::Syntax))]
    #[case(json!(null), Err(ErrorCode::Syntax))]
    fn test_selector(#[case] value: Value, #[case] expected: std::result::Result<u8, ErrorCode>) {
        let result = selector("bank", &value)
            .map(|id| id.as_u8())
            .map_err(|e| e.code());
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case(json!(true), Ok(true))]
    #[case(json!(false), Ok(false))]
    #[case(json!(1), Err(ErrorCode::Syntax))]
    #[case(json!("true"), Err(ErrorCode::Syntax))]
    fn test_boolean(#[case] value: Value, #[case] expected: std::result::Result<bool, ErrorCode>) {
        assert_eq!(boolean("enable", &value).map_err(|e| e.code()), expected);
    }

    #[rstest]
    #[case(json!(100), Ok(100))]
    #[case(json!(3_600_000), Ok(3_600_000))]
    #[case(json!(500.0), Ok(500))]
    #[case(json!(500.5), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!(99), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!(-5), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!("100"), Err(ErrorCode::Syntax))]
    fn test_bounded(#[case] value: Value, #[case] expected: std::result::Result<u64, ErrorCode>) {
        assert_eq!(
            bounded("interval", &value, 100..=3_600_000).map_err(|e| e.code()),
            expected
        );
    }

    #[rstest]
    #[case(json!("input"), Ok(Direction::Input))]
    #[case(json!("output"), Ok(Direction::Output))]
    #[case(json!("Input"), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!("sideways"), Err(ErrorCode::ParamOutOfRange))]
    #[case(json!(0), Err(ErrorCode::Syntax))]
    fn test_enumerated(
        #[case] value: Value,
        #[case] expected: std::result::Result<Direction, ErrorCode>,
    ) {
        assert_eq!(
            enumerated::<Direction>("direction", &value).map_err(|e| e.code()),
            expected
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(strings("to", &json!("a@x")).unwrap(), vec!["a@x"]);
        assert_eq!(
            strings("to", &json!(["a@x", "b@x"])).unwrap(),
            vec!["a@x", "b@x"]
        );
        assert_eq!(
            strings("to", &json!(["a@x", 1])).unwrap_err().code(),
            ErrorCode::Syntax
        );
        assert_eq!(strings("to", &json!(7)).unwrap_err().code(), ErrorCode::Syntax);
    }
}
