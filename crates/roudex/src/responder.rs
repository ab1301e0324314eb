//! Failure responders: the last step of the failure path.
//!
//! A [`FailureResponder`] receives the classified [`Failure`] together with the request
//! context. It either writes a response onto the context ([`WriteResponder`]) or throws the
//! failure back to the host ([`ThrowResponder`]), which then renders it. Either way the
//! client sees the failure's code as status and its message as body.
//!
//! Closures with the same signature are responders too, which is how `on_error` overrides are
//! usually given:
//!
//! ```
//! use roudex::{Failure, MiddlewareError, RequestContext};
//! use roudex::responder::FailureResponder;
//!
//! fn assert_responder<R: FailureResponder>(_r: R) {}
//!
//! assert_responder(|failure: Failure, ctx: &mut RequestContext| -> Result<(), MiddlewareError> {
//!     ctx.send(failure.status(), format!("{{\"error\":\"{}\"}}", failure.message()));
//!     Ok(())
//! });
//! ```

use crate::context::RequestContext;
use crate::error::{Failure, MiddlewareError};

pub trait FailureResponder: Send + Sync {
    fn respond(&self, failure: Failure, ctx: &mut RequestContext) -> Result<(), MiddlewareError>;
}

impl<F> FailureResponder for F
where
    F: Fn(Failure, &mut RequestContext) -> Result<(), MiddlewareError> + Send + Sync,
{
    fn respond(&self, failure: Failure, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        (self)(failure, ctx)
    }
}

/// Writes the status code and the message onto the context's response
#[derive(Default, Clone, Copy, Debug)]
pub struct WriteResponder;

impl FailureResponder for WriteResponder {
    fn respond(&self, failure: Failure, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        ctx.send_failure(&failure);
        Ok(())
    }
}

/// Throws the failure to the host, which turns it into a response
#[derive(Default, Clone, Copy, Debug)]
pub struct ThrowResponder;

impl FailureResponder for ThrowResponder {
    fn respond(&self, failure: Failure, _ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        Err(MiddlewareError::from(failure))
    }
}
