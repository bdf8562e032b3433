/*!
The dispatcher: one RPC call end-to-end.

Lookup, decode, invoke, result shaping. Synchronous and lock-free; the
surrounding transport decides how many threads call in.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::any::Any;
use std::fmt;

use tracing::{debug, trace};

use crate::decode::{ArgDecoder, Args};
use crate::errors::DispatchError;
use crate::registry::Registry;

/// Type-erased reply container.
///
/// The concrete type matches the reply type declared by the method that was
/// invoked; callers downcast using the method identity they requested.
pub struct Reply(Box<dyn Any + Send>);

impl Reply {
    pub(crate) fn new(inner: Box<dyn Any + Send>) -> Self {
        Reply(inner)
    }

    /// Whether the reply holds a value of type `R`.
    pub fn is<R: Any>(&self) -> bool {
        self.0.is::<R>()
    }

    /// Borrow the reply as `R`, if that is what the invoked method produced.
    pub fn downcast_ref<R: Any>(&self) -> Option<&R> {
        self.0.downcast_ref::<R>()
    }

    /// Take ownership of the reply as `R`, handing the container back on a
    /// type mismatch.
    pub fn downcast<R: Any>(self) -> Result<Box<R>, Reply> {
        self.0.downcast::<R>().map_err(Reply)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reply(..)")
    }
}

/// Executes RPC calls against a populated [`Registry`].
///
/// `C` is the transport-context type carried through to context-convention
/// services; it is passed through unexamined.
pub struct Dispatcher<C = ()> {
    registry: Registry<C>,
}

impl<C: 'static> Dispatcher<C> {
    /// Wrap a fully populated registry.
    pub fn new(registry: Registry<C>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher serves from.
    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// Execute one call: resolve `name`, decode `args`, invoke, shape the
    /// result.
    ///
    /// Lookup failures propagate before anything is allocated or decoded;
    /// decode failures propagate before the method runs. A handler error
    /// comes back as [`DispatchError::Invocation`] carrying the (possibly
    /// partially populated) reply. A failed call leaves the registry ready
    /// for the next one.
    pub fn invoke(
        &self,
        ctx: Option<&C>,
        decoder: &dyn ArgDecoder,
        name: &str,
        args: &Args,
    ) -> Result<Reply, DispatchError> {
        debug!(target: "rpc-dispatch", method = name, "dispatching call");
        let (service, method) = self.registry.resolve(name)?;

        let mut argument = method.new_args();
        decoder
            .decode(args, argument.as_mut())
            .map_err(|source| DispatchError::Decode {
                target: name.to_owned(),
                source,
            })?;

        let mut reply = method.new_reply();
        // Context-free services never see the context, whatever the caller
        // supplied.
        let ctx = if service.pass_context() { ctx } else { None };
        trace!(
            target: "rpc-dispatch",
            method = name,
            pass_context = service.pass_context(),
            "invoking handler"
        );
        match method.invoke(ctx, argument.as_any(), reply.as_mut()) {
            Ok(()) => Ok(Reply::new(reply)),
            Err(source) => Err(DispatchError::Invocation {
                target: name.to_owned(),
                reply: Reply::new(reply),
                source,
            }),
        }
    }
}
