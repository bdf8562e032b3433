/*!
Error taxonomy for registration and dispatch.

Transport-agnostic errors that adapters can map to HTTP status codes,
JSON-RPC error objects, or embedded error codes as they see fit.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use thiserror::Error;

use crate::dispatch::Reply;

/// Business error reported by an invoked method handler.
///
/// Handlers may fail with any error type; the dispatcher surfaces it
/// verbatim behind this boxed alias.
pub type MethodError = Box<dyn std::error::Error + Send + Sync>;

/// Decode failures reported by an [`ArgDecoder`](crate::decode::ArgDecoder).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The arguments container does not match the declared argument
    /// structure (wrong primitive type, unknown shape, missing field).
    #[error("argument structure mismatch: {0}")]
    Structure(#[from] serde_json::Error),

    /// A hand-rolled decoder rejected the arguments.
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Build a [`DecodeError::Custom`] from any displayable message.
    pub fn custom(msg: impl Into<String>) -> Self {
        DecodeError::Custom(msg.into())
    }
}

/// Registration-phase failures.
///
/// Registration happens once, before serving; every one of these is a
/// programming error in service wiring and none can occur during dispatch.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// A service with this name is already installed. Re-registration is
    /// a conflict, never a silent overwrite.
    #[error("service '{service}' is already registered")]
    DuplicateService { service: String },

    /// Two methods with the same name were added to one service builder.
    #[error("method '{method}' is already registered on this service")]
    DuplicateMethod { method: String },

    /// A handler of the wrong shape was added for the service's calling
    /// convention (context-passing vs. plain).
    #[error(
        "handler for method '{method}' does not match the service calling convention (pass_context = {service_passes_context})"
    )]
    ConventionMismatch {
        method: String,
        service_passes_context: bool,
    },
}

/// Per-call failures returned by [`Dispatcher::invoke`](crate::dispatch::Dispatcher::invoke).
///
/// Lookup, decode, and business failures all arrive through this one enum;
/// callers wanting different handling match on the variant. No failure is
/// ever fatal to the registry: each call is independent.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dotted name does not split into exactly two non-empty parts.
    #[error("malformed method name '{name}': expected \"Service.Method\"")]
    MalformedName { name: String },

    /// The service part names no registered service.
    #[error("service '{service}' is not registered")]
    ServiceNotFound { service: String },

    /// The method part is unknown within an otherwise valid service.
    #[error("method '{method}' is not registered on service '{service}'")]
    MethodNotFound { service: String, method: String },

    /// The caller-supplied decoder rejected the arguments. The target
    /// method was never invoked.
    #[error("invalid arguments for '{target}': {source}")]
    Decode {
        target: String,
        #[source]
        source: DecodeError,
    },

    /// The target method's own business logic reported an error. The reply
    /// it was writing into is carried along; it may be only partially
    /// populated.
    #[error("method '{target}' failed: {source}")]
    Invocation {
        target: String,
        reply: Reply,
        #[source]
        source: MethodError,
    },
}

impl DispatchError {
    /// The reply produced by a failed invocation, if one got that far.
    ///
    /// `Some` only for [`DispatchError::Invocation`]; lookup and decode
    /// failures abort before a reply is allocated.
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            DispatchError::Invocation { reply, .. } => Some(reply),
            _ => None,
        }
    }

    /// Consume the error, keeping the partially populated reply if any.
    pub fn into_reply(self) -> Option<Reply> {
        match self {
            DispatchError::Invocation { reply, .. } => Some(reply),
            _ => None,
        }
    }
}
