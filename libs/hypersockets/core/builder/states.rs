//! Compile-time markers for the client builder
//!
//! A stream client needs an endpoint and a router before it can be built;
//! `build()` only exists once both markers read `Has*`.
//!
//! ```compile_fail
//! // No router: `build` is not available
//! let _ = hypersockets::builder().url("ws://localhost:1/ws").build();
//! ```

use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// Whether the endpoint URL has been provided
pub trait UrlState: sealed::Sealed {}

/// Whether the frame router has been provided
pub trait RouterState: sealed::Sealed {}

pub struct NoUrl;
pub struct HasUrl;
pub struct NoRouter;
pub struct HasRouter;

impl sealed::Sealed for NoUrl {}
impl sealed::Sealed for HasUrl {}
impl sealed::Sealed for NoRouter {}
impl sealed::Sealed for HasRouter {}

impl UrlState for NoUrl {}
impl UrlState for HasUrl {}
impl RouterState for NoRouter {}
impl RouterState for HasRouter {}

/// Zero-sized carrier for the two markers
///
/// `fn() -> (U, R)` keeps the builder `Send + Sync` whatever the markers are.
#[derive(Debug, Clone, Copy)]
pub struct TypeState<U, R>(PhantomData<fn() -> (U, R)>);

impl<U: UrlState, R: RouterState> TypeState<U, R> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}
