//! msgpack codec between typed messages and `mrpc::Value`.

use mrpc::Value;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors from encoding/decoding bus payloads.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload was not the expected binary value.
    #[error("expected binary message payload, got {0:?}")]
    InvalidValueType(Value),
    /// The binary payload did not decode as the requested type.
    #[error(transparent)]
    Decode(#[from] rmp_serde::decode::Error),
    /// The message failed to encode.
    #[error(transparent)]
    Encode(#[from] rmp_serde::encode::Error),
}

/// Encodes a serializable message into a binary `mrpc::Value`.
pub fn to_value<T: Serialize>(msg: &T) -> Result<Value, Error> {
    Ok(Value::Binary(rmp_serde::to_vec_named(msg)?))
}

/// Decodes a binary `mrpc::Value` back into a typed message.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, Error> {
    match value {
        Value::Binary(bytes) => Ok(rmp_serde::from_slice(bytes)?),
        other => Err(Error::InvalidValueType(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyState, RegisterReq, ShortcutEvent};

    #[test]
    fn roundtrip_typed_payloads() {
        let req = RegisterReq {
            component: "org.example.editor".into(),
            action: "save-all".into(),
            component_friendly: "Editor".into(),
            action_friendly: "Save All".into(),
            context: String::new(),
        };
        let back: RegisterReq = from_value(&to_value(&req).unwrap()).unwrap();
        assert_eq!(back, req);

        let event = ShortcutEvent {
            component: "c".into(),
            object_path: "/component/c".into(),
            action: "a".into(),
            state: KeyState::Released,
        };
        let back: ShortcutEvent = from_value(&to_value(&event).unwrap()).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn non_binary_value_is_rejected() {
        let err = from_value::<ShortcutEvent>(&Value::Boolean(true)).unwrap_err();
        assert!(matches!(err, Error::InvalidValueType(_)));
    }
}
