/*!
Argument decoding contracts.

The dispatcher never prescribes how untyped arguments become a typed
argument struct; it only fixes the signature. [`JsonDecoder`] is the
strict serde-backed default, [`decoder_fn`] wraps any closure with a
custom strategy (field-by-field copying, weak typing, defaulting).

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::any::Any;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::DecodeError;

/// Untyped arguments container: string keys to arbitrary JSON values.
pub type Args = serde_json::Map<String, Value>;

/// Object-safe view of a decode destination.
///
/// The dispatcher hands decoders a destination of an opaque type; this
/// trait is the only surface they get. Strict decoders go through
/// [`decode_value`](DecodeTarget::decode_value); hand-rolled decoders that
/// know the concrete argument type may downcast via
/// [`as_any_mut`](DecodeTarget::as_any_mut) and copy fields manually.
pub trait DecodeTarget: Any + Send {
    /// Replace the destination with the deserialized form of `value`.
    fn decode_value(&mut self, value: Value) -> Result<(), DecodeError>;

    /// The destination as `Any`, for read access.
    fn as_any(&self) -> &dyn Any;

    /// The destination as mutable `Any`, for manual field copying.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> DecodeTarget for T
where
    T: DeserializeOwned + Any + Send,
{
    fn decode_value(&mut self, value: Value) -> Result<(), DecodeError> {
        *self = serde_json::from_value(value)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Caller-supplied decode strategy.
///
/// Must be deterministic; a failure aborts the call before the target
/// method runs.
pub trait ArgDecoder {
    /// Decode `args` into the opaque destination.
    fn decode(&self, args: &Args, target: &mut dyn DecodeTarget) -> Result<(), DecodeError>;
}

/// Strict JSON-backed decoder.
///
/// Deserializes the argument map wholesale via serde, so a string where an
/// integer field is declared is a structural mismatch, not a coercion.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl ArgDecoder for JsonDecoder {
    fn decode(&self, args: &Args, target: &mut dyn DecodeTarget) -> Result<(), DecodeError> {
        target.decode_value(Value::Object(args.clone()))
    }
}

/// Adapter turning a closure into an [`ArgDecoder`].
pub struct DecoderFn<F>(F);

/// Wrap a closure as a decoder.
///
/// ```
/// use rpc_dispatch::{decoder_fn, Args, DecodeError, DecodeTarget};
/// use serde_json::Value;
///
/// // Decoder that drops null-valued keys before the strict decode.
/// let lenient = decoder_fn(|args: &Args, target: &mut dyn DecodeTarget| {
///     let kept: Args = args
///         .iter()
///         .filter(|(_, v)| !v.is_null())
///         .map(|(k, v)| (k.clone(), v.clone()))
///         .collect();
///     target.decode_value(Value::Object(kept))
/// });
/// # let _ = lenient;
/// ```
pub fn decoder_fn<F>(f: F) -> DecoderFn<F>
where
    F: Fn(&Args, &mut dyn DecodeTarget) -> Result<(), DecodeError>,
{
    DecoderFn(f)
}

impl<F> ArgDecoder for DecoderFn<F>
where
    F: Fn(&Args, &mut dyn DecodeTarget) -> Result<(), DecodeError>,
{
    fn decode(&self, args: &Args, target: &mut dyn DecodeTarget) -> Result<(), DecodeError> {
        (self.0)(args, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Pair {
        a: i64,
        b: i64,
    }

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn json_decoder_fills_declared_struct() {
        let mut target = Pair::default();
        JsonDecoder
            .decode(&args(json!({"a": 2, "b": 3})), &mut target)
            .unwrap();
        assert_eq!(target, Pair { a: 2, b: 3 });
    }

    #[test]
    fn json_decoder_rejects_type_mismatch() {
        let mut target = Pair::default();
        let err = JsonDecoder
            .decode(&args(json!({"a": "2", "b": 3})), &mut target)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Structure(_)));
    }

    #[test]
    fn decoder_fn_supports_manual_field_copying() {
        let manual = decoder_fn(|args: &Args, target: &mut dyn DecodeTarget| {
            let pair = target
                .as_any_mut()
                .downcast_mut::<Pair>()
                .ok_or_else(|| DecodeError::custom("unexpected destination type"))?;
            pair.a = args
                .get("a")
                .and_then(Value::as_i64)
                .ok_or_else(|| DecodeError::custom("missing 'a'"))?;
            pair.b = args
                .get("b")
                .and_then(Value::as_i64)
                .ok_or_else(|| DecodeError::custom("missing 'b'"))?;
            Ok(())
        });

        let mut target = Pair::default();
        manual
            .decode(&args(json!({"a": 4, "b": 5})), &mut target)
            .unwrap();
        assert_eq!(target, Pair { a: 4, b: 5 });

        let err = manual.decode(&args(json!({"a": 4})), &mut target).unwrap_err();
        assert!(matches!(err, DecodeError::Custom(_)));
    }
}
