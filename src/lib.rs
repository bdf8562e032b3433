/*!
# rpc-dispatch

Transport-agnostic RPC method registry and dynamic dispatcher: resolve a
dotted `"Service.Method"` name, decode untyped arguments into the method's
declared argument type, invoke, and hand back the typed reply plus an
optional error. Callers get RPC-style business logic without per-method
glue code — handy inside templating engines, internal tooling, or
transports other than plain HTTP/JSON-RPC.

## Architecture

```text
┌─────────────────────────────────────────────────────────────────┐
│                    TRANSPORT ADAPTERS                            │
│  HTTP handler, TCP listener, template engine, CLI tooling        │
└────────────────────────────┬────────────────────────────────────┘
                             ↓  (method name + untyped args)
┌─────────────────────────────────────────────────────────────────┐
│                 DISPATCHER (this crate)                          │
│  • Registry    - "Service.Method" → (ServiceSpec, MethodSpec)   │
│  • Dispatcher  - decode → invoke → reply/error shaping          │
│  • ArgDecoder  - pluggable untyped→typed argument decoding      │
└────────────────────────────┬────────────────────────────────────┘
                             ↓  (typed argument / reply structs)
┌─────────────────────────────────────────────────────────────────┐
│                    SERVICE RECEIVERS                             │
│  Plain Rust structs with handler methods                         │
└─────────────────────────────────────────────────────────────────┘
```

## Design Principles

1. **No runtime reflection**: registration captures argument/reply
   factories and an invoke closure pre-bound to the receiver; dispatch
   just calls them.
2. **Register, then serve**: the registry is written once during startup
   and is read-only (and freely shareable across threads) during dispatch.
3. **Explicit calling convention**: whether a service's handlers receive
   the transport context is fixed per service at build time, never
   inferred per call.
4. **Pluggable decoding**: the dispatcher fixes only the decoder
   signature; strict serde decoding ([`JsonDecoder`]) is the default, any
   other strategy plugs in via [`decoder_fn`].

## Usage

```rust
use rpc_dispatch::{Args, Dispatcher, JsonDecoder, Registry, ServiceBuilder};
use serde::Deserialize;
use std::convert::Infallible;

#[derive(Default)]
struct Arith;

#[derive(Debug, Default, Deserialize)]
struct MultiplyArgs {
    a: i64,
    b: i64,
}

#[derive(Debug, Default)]
struct MultiplyReply {
    result: i64,
}

impl Arith {
    fn multiply(&self, args: &MultiplyArgs, reply: &mut MultiplyReply) -> Result<(), Infallible> {
        reply.result = args.a * args.b;
        Ok(())
    }
}

let mut registry: Registry = Registry::new();
registry
    .register(
        "Arith",
        ServiceBuilder::new(Arith).method("Multiply", Arith::multiply),
    )
    .unwrap();

let dispatcher = Dispatcher::new(registry);
let args: Args = serde_json::json!({"a": 2, "b": 3})
    .as_object()
    .cloned()
    .unwrap();
let reply = dispatcher
    .invoke(None, &JsonDecoder, "Arith.Multiply", &args)
    .unwrap();
assert_eq!(reply.downcast_ref::<MultiplyReply>().unwrap().result, 6);
```

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod decode;
pub mod dispatch;
pub mod errors;
pub mod registry;

// Re-export for convenience
pub use decode::{decoder_fn, ArgDecoder, Args, DecodeTarget, DecoderFn, JsonDecoder};
pub use dispatch::{Dispatcher, Reply};
pub use errors::{DecodeError, DispatchError, MethodError, RegisterError};
pub use registry::{MethodSpec, Registry, ServiceBuilder, ServiceSpec};
