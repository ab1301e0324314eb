use bytes::Bytes;
use http::{Request, Response, StatusCode};
use tracing::{debug, error};

use crate::context::{PathParams, RequestContext};
use crate::error::{ConfigError, MiddlewareError};
use crate::host::Host;

type InnerRouter<T> = matchit::Router<T>;

/// Routes request paths to hosts
pub struct Router<H> {
    inner_router: InnerRouter<H>,
}

/// Result of matching a route, the matched host and the path parameters
pub struct RouteMatch<'router, H> {
    host: &'router H,
    params: PathParams,
}

impl<H> Router<H> {
    pub fn builder() -> RouterBuilder<H> {
        RouterBuilder::new()
    }

    /// Matches a path against the router's routes, percent-decoding the parameter values
    ///
    /// # Arguments
    /// * `path` - The path to match against
    pub fn at(&self, path: &str) -> Option<RouteMatch<'_, H>> {
        self.inner_router
            .at(path)
            .map(|matched| RouteMatch { host: matched.value, params: matched.params.into() })
            .map_err(|e| debug!("match '{}' error: {}", path, e))
            .ok()
    }
}

impl<H: Host> Router<H> {
    /// Runs the request through the host its path matches.
    ///
    /// Unmatched paths get an empty 404 response. Errors the host does not render, such as a
    /// route parameter a middleware requires but the route does not declare, are returned.
    pub async fn dispatch(&self, request: Request<()>) -> Result<Response<Bytes>, MiddlewareError> {
        let Some(RouteMatch { host, params }) = self.at(request.uri().path()) else {
            let mut response = Response::new(Bytes::new());
            *response.status_mut() = StatusCode::NOT_FOUND;
            return Ok(response);
        };

        let mut ctx = RequestContext::new(request).with_params(params);
        match host.handle(&mut ctx).await {
            Ok(()) => Ok(ctx.into_response()),
            Err(e) => {
                error!(cause = %e, path = ctx.uri().path(), "request failed");
                Err(e)
            }
        }
    }
}

impl<H> RouteMatch<'_, H> {
    pub fn host(&self) -> &H {
        self.host
    }

    /// Gets the path parameters from the matched route
    pub fn params(&self) -> &PathParams {
        &self.params
    }
}

pub struct RouterBuilder<H> {
    routes: Vec<(String, H)>,
}

impl<H> RouterBuilder<H> {
    fn new() -> Self {
        Self { routes: vec![] }
    }

    pub fn route(mut self, route: impl Into<String>, host: H) -> Self {
        self.routes.push((route.into(), host));
        self
    }

    /// Builds the router, rejecting malformed or conflicting routes
    pub fn build(self) -> Result<Router<H>, ConfigError> {
        let mut inner_router = InnerRouter::new();

        for (path, host) in self.routes {
            inner_router
                .insert(path.clone(), host)
                .map_err(|source| ConfigError::InvalidRoute { path, source })?;
        }

        Ok(Router { inner_router })
    }
}
