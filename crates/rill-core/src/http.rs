#![forbid(unsafe_code)]

//! HTTP boundary types.
//!
//! Transport is an external collaborator: the core only defines the shape
//! of the seam. A [`Fetch`] function turns a [`Request`] into an
//! observable that emits exactly one [`Response`] then completes, or
//! errors with [`StreamError::Producer`](crate::StreamError) on a non-2xx
//! status or transport failure. `rill-harness` ships a canned-route
//! implementation for tests and demos.

use std::rc::Rc;

use crate::error::StreamError;
use crate::observable::Observable;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Idempotent read.
    Get,
    /// Submission with a body.
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// A request handed to a [`Fetch`] function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Full request URL, query string included.
    pub url: String,
    /// Optional request body (typically JSON).
    pub body: Option<String>,
}

impl Request {
    /// A GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    /// A POST request with a body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body.into()),
        }
    }
}

/// A parsed response delivered on the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl Response {
    /// A 200 response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The transport seam: request in, single-response observable out.
///
/// Contract: the returned observable emits exactly one value then
/// completes, or errors. Cancelling the subscription does not guarantee
/// the in-flight request is aborted unless the implementation's teardown
/// says so.
pub type Fetch = Rc<dyn Fn(Request) -> Observable<Response>>;

/// Wrap a transport so that non-2xx responses become producer errors
/// instead of values, for pipelines that treat any failure the same way.
#[must_use]
pub fn fetch_ok(fetch: Fetch) -> Fetch {
    Rc::new(move |request: Request| {
        let url = request.url.clone();
        fetch(request).try_map(move |response| {
            if response.is_success() {
                Ok(response)
            } else {
                Err(StreamError::producer(format!(
                    "{} for {url}",
                    response.status
                )))
            }
        })
    })
}
