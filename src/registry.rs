/*!
Service registry: name resolution and registration-time type capture.

All type knowledge is captured here, when services are registered. Each
method entry stores an argument factory, a reply factory, and an invoke
closure pre-bound to the shared receiver; dispatch never introspects
types, it only calls what registration built.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::decode::DecodeTarget;
use crate::errors::{DispatchError, MethodError, RegisterError};

type ArgFactory = Box<dyn Fn() -> Box<dyn DecodeTarget> + Send + Sync>;
type ReplyFactory = Box<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;
type InvokeFn<C> =
    Box<dyn Fn(Option<&C>, &dyn Any, &mut dyn Any) -> Result<(), MethodError> + Send + Sync>;

/// Registry entries are built so that factories and invoke closure agree on
/// the argument/reply types; hitting this error means the entry was
/// assembled outside that pairing.
#[derive(Debug, Error)]
#[error("registry entry invoked with mismatched {slot} type (expected {expected})")]
struct SlotTypeMismatch {
    slot: &'static str,
    expected: &'static str,
}

fn slot_mismatch<T>(slot: &'static str) -> MethodError {
    Box::new(SlotTypeMismatch {
        slot,
        expected: type_name::<T>(),
    })
}

// ============================================================================
// METHOD / SERVICE SPECS
// ============================================================================

/// One invocable method: type-erased factories plus the invoke closure.
/// Immutable once registered.
pub struct MethodSpec<C> {
    new_args: ArgFactory,
    new_reply: ReplyFactory,
    invoke: InvokeFn<C>,
}

impl<C> MethodSpec<C> {
    /// Fresh default-valued instance of the method's argument type,
    /// exclusively owned by one invocation.
    pub(crate) fn new_args(&self) -> Box<dyn DecodeTarget> {
        (self.new_args)()
    }

    /// Fresh default-valued instance of the method's reply type.
    pub(crate) fn new_reply(&self) -> Box<dyn Any + Send> {
        (self.new_reply)()
    }

    /// Run the handler against decoded arguments and a reply destination.
    pub(crate) fn invoke(
        &self,
        ctx: Option<&C>,
        args: &dyn Any,
        reply: &mut dyn Any,
    ) -> Result<(), MethodError> {
        (self.invoke)(ctx, args, reply)
    }
}

impl<C> std::fmt::Debug for MethodSpec<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodSpec").finish_non_exhaustive()
    }
}

/// A named group of methods sharing one receiver and one calling
/// convention.
pub struct ServiceSpec<C> {
    pass_context: bool,
    methods: HashMap<String, MethodSpec<C>>,
}

impl<C> ServiceSpec<C> {
    /// Whether invocations of this service's methods receive the transport
    /// context.
    pub fn pass_context(&self) -> bool {
        self.pass_context
    }

    /// Names of the registered methods, in no particular order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl<C> std::fmt::Debug for ServiceSpec<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSpec")
            .field("pass_context", &self.pass_context)
            .field("methods", &self.methods)
            .finish()
    }
}

// ============================================================================
// SERVICE BUILDER
// ============================================================================

/// Builder collecting the methods of one service before installation.
///
/// The calling convention is fixed by the constructor: [`ServiceBuilder::new`]
/// for plain handlers, [`ServiceBuilder::with_context`] for handlers that
/// receive the transport context. Adding a handler of the wrong shape is
/// recorded and surfaced by [`Registry::register`].
pub struct ServiceBuilder<S, C = ()> {
    receiver: Arc<S>,
    pass_context: bool,
    methods: HashMap<String, MethodSpec<C>>,
    defect: Option<RegisterError>,
}

impl<S, C> ServiceBuilder<S, C>
where
    S: Send + Sync + 'static,
    C: 'static,
{
    /// Service whose handlers never see the transport context:
    /// `Fn(&S, &Args, &mut Reply) -> Result<(), E>`.
    pub fn new(receiver: S) -> Self {
        Self {
            receiver: Arc::new(receiver),
            pass_context: false,
            methods: HashMap::new(),
            defect: None,
        }
    }

    /// Service whose handlers receive the transport context:
    /// `Fn(&S, Option<&C>, &Args, &mut Reply) -> Result<(), E>`.
    pub fn with_context(receiver: S) -> Self {
        Self {
            receiver: Arc::new(receiver),
            pass_context: true,
            methods: HashMap::new(),
            defect: None,
        }
    }

    /// Add a plain-convention method.
    pub fn method<A, R, E, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        A: DeserializeOwned + Default + Any + Send,
        R: Default + Any + Send,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&S, &A, &mut R) -> Result<(), E> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.pass_context {
            self.record(RegisterError::ConventionMismatch {
                method: name,
                service_passes_context: true,
            });
            return self;
        }
        let receiver = Arc::clone(&self.receiver);
        let invoke: InvokeFn<C> = Box::new(move |_ctx, args, reply| {
            let args = args
                .downcast_ref::<A>()
                .ok_or_else(|| slot_mismatch::<A>("argument"))?;
            let reply = reply
                .downcast_mut::<R>()
                .ok_or_else(|| slot_mismatch::<R>("reply"))?;
            handler(&receiver, args, reply).map_err(|e| Box::new(e) as MethodError)
        });
        self.insert(name, Self::spec::<A, R>(invoke));
        self
    }

    /// Add a context-convention method.
    pub fn context_method<A, R, E, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        A: DeserializeOwned + Default + Any + Send,
        R: Default + Any + Send,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&S, Option<&C>, &A, &mut R) -> Result<(), E> + Send + Sync + 'static,
    {
        let name = name.into();
        if !self.pass_context {
            self.record(RegisterError::ConventionMismatch {
                method: name,
                service_passes_context: false,
            });
            return self;
        }
        let receiver = Arc::clone(&self.receiver);
        let invoke: InvokeFn<C> = Box::new(move |ctx, args, reply| {
            let args = args
                .downcast_ref::<A>()
                .ok_or_else(|| slot_mismatch::<A>("argument"))?;
            let reply = reply
                .downcast_mut::<R>()
                .ok_or_else(|| slot_mismatch::<R>("reply"))?;
            handler(&receiver, ctx, args, reply).map_err(|e| Box::new(e) as MethodError)
        });
        self.insert(name, Self::spec::<A, R>(invoke));
        self
    }

    fn spec<A, R>(invoke: InvokeFn<C>) -> MethodSpec<C>
    where
        A: DeserializeOwned + Default + Any + Send,
        R: Default + Any + Send,
    {
        MethodSpec {
            new_args: Box::new(|| Box::new(A::default())),
            new_reply: Box::new(|| Box::new(R::default())),
            invoke,
        }
    }

    fn insert(&mut self, name: String, spec: MethodSpec<C>) {
        if self.methods.contains_key(&name) {
            self.record(RegisterError::DuplicateMethod { method: name });
            return;
        }
        self.methods.insert(name, spec);
    }

    // Only the first defect is kept; it is the one worth reporting.
    fn record(&mut self, err: RegisterError) {
        if self.defect.is_none() {
            self.defect = Some(err);
        }
    }

    fn finish(self) -> Result<ServiceSpec<C>, RegisterError> {
        match self.defect {
            Some(err) => Err(err),
            None => Ok(ServiceSpec {
                pass_context: self.pass_context,
                methods: self.methods,
            }),
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Mapping from service name to [`ServiceSpec`].
///
/// Built during a single-writer registration phase, read-only during
/// dispatch; a fully populated registry is safe for unlimited concurrent
/// reads. Registration races are the caller's problem by design: register,
/// then serve.
pub struct Registry<C = ()> {
    services: HashMap<String, ServiceSpec<C>>,
}

impl<C: 'static> Registry<C> {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Install a built service under `name`.
    ///
    /// Fails with [`RegisterError::DuplicateService`] if `name` is taken,
    /// leaving the existing registration untouched, and surfaces any defect
    /// the builder recorded.
    pub fn register<S>(
        &mut self,
        name: impl Into<String>,
        service: ServiceBuilder<S, C>,
    ) -> Result<(), RegisterError>
    where
        S: Send + Sync + 'static,
    {
        let name = name.into();
        let spec = service.finish()?;
        if self.services.contains_key(&name) {
            return Err(RegisterError::DuplicateService { service: name });
        }
        self.services.insert(name, spec);
        Ok(())
    }

    /// Whether a service with this exact name is registered.
    pub fn contains(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    /// Names of the registered services, in no particular order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Resolve a dotted `"Service.Method"` name.
    ///
    /// Pure read; the only point where name-based errors originate. The
    /// three failure kinds stay distinct for caller diagnostics.
    pub fn resolve(&self, name: &str) -> Result<(&ServiceSpec<C>, &MethodSpec<C>), DispatchError> {
        let (service_name, method_name) = split_dotted(name)?;
        let service =
            self.services
                .get(service_name)
                .ok_or_else(|| DispatchError::ServiceNotFound {
                    service: service_name.to_owned(),
                })?;
        let method =
            service
                .methods
                .get(method_name)
                .ok_or_else(|| DispatchError::MethodNotFound {
                    service: service_name.to_owned(),
                    method: method_name.to_owned(),
                })?;
        Ok((service, method))
    }
}

impl<C: 'static> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exactly one separator, both parts non-empty, case-sensitive.
fn split_dotted(name: &str) -> Result<(&str, &str), DispatchError> {
    let mut parts = name.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(service), Some(method), None) if !service.is_empty() && !method.is_empty() => {
            Ok((service, method))
        }
        _ => Err(DispatchError::MalformedName {
            name: name.to_owned(),
        }),
    }
}
