//! Replaying adapters that serve recorded interactions from cassettes.

pub mod image_editor;

use std::sync::{Arc, Mutex};

use crate::cassette::replayer::CassetteReplayer;

/// Take the next recorded output for a port and method.
///
/// # Errors
///
/// Returns an error if the cassette has nothing left for the pair.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, String> {
    let mut guard = replayer.lock().map_err(|e| format!("replayer lock poisoned: {e}"))?;
    guard.next_interaction(port, method).map(|i| i.output)
}

/// Interpret a replayed output as `Result<T, String>`.
///
/// A bare value without an `Ok`/`Err` wrapper is treated as `Ok`.
pub(crate) fn replay_result<T: serde::de::DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, String> {
    if let Some(err_val) = output.get("Err").or_else(|| output.get("err")) {
        return Err(err_val.as_str().unwrap_or("replayed error").to_string());
    }
    let ok_val = match output.get("Ok").or_else(|| output.get("ok")) {
        Some(v) => v.clone(),
        None => output,
    };
    serde_json::from_value(ok_val).map_err(|e| format!("Malformed replayed output: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_wrapper_is_unwrapped() {
        let v: Vec<u32> = replay_result(json!({"Ok": [1, 2]})).unwrap();
        assert_eq!(v, vec![1, 2]);
    }

    #[test]
    fn bare_value_is_ok() {
        let v: Vec<u32> = replay_result(json!([3])).unwrap();
        assert_eq!(v, vec![3]);
    }

    #[test]
    fn err_wrapper_carries_message() {
        let err = replay_result::<Vec<u32>>(json!({"Err": "ECONNRESET"})).unwrap_err();
        assert_eq!(err, "ECONNRESET");
    }

    #[test]
    fn wrong_shape_is_reported() {
        let err = replay_result::<Vec<u32>>(json!({"Ok": "nope"})).unwrap_err();
        assert!(err.starts_with("Malformed replayed output"));
    }
}
