use std::time::Duration;

use async_trait::async_trait;

use super::{ActionFault, ActionInvocation, ActionInvoker, ArgValue};

const COMPONENT_NAME: &str = "harness";

/// The invoker backing the `loadgrid agent` binary.
///
/// Exposes a single `harness` component with a handful of methods useful for
/// smoke-testing a deployment: `echo` returns its first argument, `sleep_ms`
/// waits, `fail` reports an action-level failure. Anything else is an
/// infrastructure fault, mirroring an unknown remote component.
#[derive(Debug, Default)]
pub struct BuiltinInvoker;

impl BuiltinInvoker {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionInvoker for BuiltinInvoker {
    async fn invoke(&self, invocation: &ActionInvocation) -> Result<serde_json::Value, ActionFault> {
        if invocation.component_name != COMPONENT_NAME {
            return Err(ActionFault::infrastructure(
                "UnknownComponent",
                format!("No component '{}' on this agent", invocation.component_name),
            ));
        }

        let arguments = invocation
            .decode_arguments()
            .map_err(|err| ActionFault::infrastructure("InvalidArguments", err.to_string()))?;

        match invocation.method_name.as_str() {
            "echo" => Ok(arguments.first().map_or(serde_json::Value::Null, |value| {
                match value {
                    ArgValue::Str(text) => serde_json::Value::String(text.clone()),
                    ArgValue::Int(number) => serde_json::Value::from(*number),
                    ArgValue::Double(number) => serde_json::Value::from(*number),
                    ArgValue::Bool(flag) => serde_json::Value::Bool(*flag),
                    ArgValue::Json(json) => json.clone(),
                }
            })),
            "sleep_ms" => {
                let millis = arguments.first().and_then(|value| match value {
                    ArgValue::Int(number) => u64::try_from(*number).ok(),
                    ArgValue::Str(_)
                    | ArgValue::Double(_)
                    | ArgValue::Bool(_)
                    | ArgValue::Json(_) => None,
                });
                match millis {
                    Some(millis) => {
                        tokio::time::sleep(Duration::from_millis(millis)).await;
                        Ok(serde_json::Value::Null)
                    }
                    None => Err(ActionFault::infrastructure(
                        "InvalidArguments",
                        "sleep_ms expects one non-negative int argument".to_owned(),
                    )),
                }
            }
            "fail" => Err(ActionFault::action(
                "ExpectedFailure",
                "harness.fail always fails".to_owned(),
            )),
            other => Err(ActionFault::infrastructure(
                "UnknownAction",
                format!("No action '{}' in component '{}'", other, COMPONENT_NAME),
            )),
        }
    }
}
