// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logging receivers built from [`ReceiverSpec`]s.
//!
//! Every call is traced and appended to a shared [`CallLog`] so a run can be
//! reported after the fact.

use crate::settings::ReceiverSpec;
use cueline_router::{ParamSet, ParamValue, Receiver, ReceiverRegistry};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One observed receiver call
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiverCall {
    /// An action was invoked
    Action {
        /// Receiver name
        receiver: String,
        /// Action key
        action: String,
        /// Parameters passed
        params: ParamSet,
    },
    /// A property was set
    Property {
        /// Receiver name
        receiver: String,
        /// Property key
        property: String,
        /// New value
        value: ParamValue,
    },
    /// The receiver was reset
    Reset {
        /// Receiver name
        receiver: String,
    },
}

impl fmt::Display for ReceiverCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action { receiver, action, params } => {
                write!(f, "{receiver}.{action}(")?;
                for (i, (name, value)) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value:?}")?;
                }
                write!(f, ")")
            }
            Self::Property { receiver, property, value } => {
                write!(f, "{receiver}.{property} = {value:?}")
            }
            Self::Reset { receiver } => write!(f, "{receiver}.reset()"),
        }
    }
}

/// Shared record of receiver calls
pub type CallLog = Rc<RefCell<Vec<ReceiverCall>>>;

fn record(log: &CallLog, call: ReceiverCall) {
    tracing::debug!("{}", call);
    log.borrow_mut().push(call);
}

/// Build a receiver that records every call it gets
pub fn logging_receiver(spec: &ReceiverSpec, log: &CallLog) -> Receiver {
    let mut receiver = Receiver::new(spec.name.clone());

    for action in &spec.actions {
        let log = log.clone();
        let name = spec.name.clone();
        let key = action.clone();
        receiver = receiver.with_action(action.clone(), move |params: &ParamSet| {
            record(
                &log,
                ReceiverCall::Action {
                    receiver: name.clone(),
                    action: key.clone(),
                    params: params.clone(),
                },
            );
        });
    }

    for property in &spec.properties {
        let log = log.clone();
        let name = spec.name.clone();
        let key = property.clone();
        receiver = receiver.with_property(property.clone(), move |value: &ParamValue| {
            record(
                &log,
                ReceiverCall::Property {
                    receiver: name.clone(),
                    property: key.clone(),
                    value: *value,
                },
            );
        });
    }

    let log = log.clone();
    let name = spec.name.clone();
    receiver.with_reset(move || record(&log, ReceiverCall::Reset { receiver: name.clone() }))
}

/// Build a registry of logging receivers
pub fn logging_registry(specs: &[ReceiverSpec], log: &CallLog) -> ReceiverRegistry {
    let mut registry = ReceiverRegistry::new();
    for spec in specs {
        if registry.register(logging_receiver(spec, log)).is_some() {
            tracing::warn!("Receiver '{}' declared twice; the last one wins", spec.name);
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_exposes_declared_keys() {
        let log = CallLog::default();
        let spec = ReceiverSpec {
            name: "lights".to_string(),
            actions: vec!["flash".to_string()],
            properties: vec!["level".to_string()],
        };
        let camera = ReceiverSpec {
            name: "camera".to_string(),
            ..ReceiverSpec::default()
        };
        let mut registry = logging_registry(&[spec, camera], &log);

        assert_eq!(registry.len(), 2);
        let lights = registry.get("lights").unwrap();
        assert!(lights.exposes_action("flash"));
        assert!(lights.exposes_property("level"));
        assert!(!lights.exposes_action("level"));

        registry.reset_all();
        let calls: Vec<String> = log.borrow().iter().map(ToString::to_string).collect();
        assert_eq!(calls, vec!["lights.reset()", "camera.reset()"]);
    }

    #[test]
    fn test_action_display() {
        let mut params = ParamSet::new();
        params.insert("gain".to_string(), ParamValue::Float(0.5));
        params.insert("lit".to_string(), ParamValue::Bool(true));
        let call = ReceiverCall::Action {
            receiver: "lights".to_string(),
            action: "flash".to_string(),
            params,
        };
        assert_eq!(call.to_string(), "lights.flash(gain: Float(0.5), lit: Bool(true))");
    }
}
