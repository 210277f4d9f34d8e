//! Default event builder.
//!
//! Turns thrown values and messages into events without any platform
//! integration: structured errors contribute their `source` chain,
//! outermost first. Deeper extraction (stack traces, OS context) belongs
//! to dedicated [`EventBuilder`] implementations.

use async_trait::async_trait;

use emberline_core::builder::{EventBuilder, ThrownValue};
use emberline_core::error::BuildError;
use emberline_core::event::{Event, EventHint, ExceptionValue, Level};

/// The builder used when options don't supply one.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEventBuilder;

#[async_trait]
impl EventBuilder for BasicEventBuilder {
    async fn event_from_exception(
        &self,
        thrown: ThrownValue,
        _hint: &EventHint,
    ) -> Result<Event, BuildError> {
        let mut event = Event::new();
        match thrown {
            ThrownValue::Error { error, type_name } => {
                event.exceptions = exception_chain(error.as_ref(), type_name);
            }
            ThrownValue::Message(message) => {
                event.exceptions = vec![ExceptionValue {
                    ty: "Error".into(),
                    value: message,
                    module: None,
                }];
            }
            ThrownValue::Value(value) => {
                event.exceptions = vec![ExceptionValue {
                    ty: "Error".into(),
                    value: value.to_string(),
                    module: None,
                }];
                event.extra.insert("thrown_value".into(), value);
            }
        }
        Ok(event)
    }

    async fn event_from_message(
        &self,
        message: &str,
        level: Level,
        _hint: &EventHint,
    ) -> Result<Event, BuildError> {
        if message.is_empty() {
            return Err(BuildError::MissingInput("message".into()));
        }
        Ok(Event::from_message(message, level))
    }
}

/// Walk the `source` chain into exception values, outermost first.
fn exception_chain(
    error: &(dyn std::error::Error + 'static),
    type_name: &'static str,
) -> Vec<ExceptionValue> {
    let mut chain = Vec::new();
    let (ty, module) = split_type_name(type_name);
    chain.push(ExceptionValue {
        ty,
        value: error.to_string(),
        module,
    });

    let mut current = error.source();
    while let Some(cause) = current {
        // Concrete type names of causes are erased behind `dyn Error`.
        chain.push(ExceptionValue {
            ty: "Error".into(),
            value: cause.to_string(),
            module: None,
        });
        current = cause.source();
    }
    chain
}

/// Split a full type path into (short name, module path).
fn split_type_name(type_name: &'static str) -> (String, Option<String>) {
    match type_name.rsplit_once("::") {
        Some((module, name)) => (name.to_string(), Some(module.to_string())),
        None => (type_name.to_string(), None),
    }
}
