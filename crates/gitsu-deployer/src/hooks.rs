//! Lifecycle hook invocation is an injected capability: the core schedules
//! `preinstall`/`postinstall` at the right points but never runs a script
//! itself (out of scope per the resolver's external-collaborators list).

use std::future::Future;
use std::pin::Pin;

pub trait HookRunner: Send + Sync {
    /// Run the named lifecycle hook (`"preinstall"` or `"postinstall"`).
    fn run<'a>(&'a self, name: &'a str) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'a>>;
}

/// A [`HookRunner`] that does nothing, for callers with no scripts to run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHookRunner;

impl HookRunner for NoopHookRunner {
    fn run<'a>(&'a self, _name: &'a str) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }
}
