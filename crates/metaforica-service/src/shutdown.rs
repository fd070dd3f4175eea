use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};

use http::{Request, Response, StatusCode};
use http_body::Body;
use pin_project::pin_project;
use tokio::sync::Notify;
use tower::{Layer, Service};

/// Shutdown flag plus the number of requests still being served.
#[derive(Clone, Default)]
pub struct ShutdownState {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    shutting_down: AtomicBool,
    in_flight: AtomicUsize,
    drained: Notify,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop admitting requests. Already running ones are allowed to finish.
    pub fn start_shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        if self.in_flight_count() == 0 {
            self.inner.drained.notify_waiters();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Resolves once no request is in flight.
    pub async fn drained(&self) {
        loop {
            let notified = self.inner.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight_count() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn enter(&self) -> InFlightGuard {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            state: self.clone(),
        }
    }
}

/// Counts a request as in flight until dropped, so cancelled requests
/// (for example by the timeout layer) are released too.
struct InFlightGuard {
    state: ShutdownState,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let previous = self.state.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 && self.state.is_shutting_down() {
            self.state.inner.drained.notify_waiters();
        }
    }
}

/// Rejects requests with 503 once shutdown has started.
#[derive(Clone)]
pub struct DrainLayer {
    state: ShutdownState,
}

impl DrainLayer {
    pub fn new(state: ShutdownState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for DrainLayer {
    type Service = DrainService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DrainService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct DrainService<S> {
    inner: S,
    state: ShutdownState,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DrainService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body + Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = DrainFuture<S::Future, ResBody, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if self.state.is_shutting_down() {
            let mut response = Response::new(ResBody::default());
            *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;

            return DrainFuture {
                kind: FutureKind::Rejected(Some(Ok(response))),
                _guard: None,
            };
        }

        let guard = self.state.enter();
        DrainFuture {
            kind: FutureKind::Inner(self.inner.call(req)),
            _guard: Some(guard),
        }
    }
}

#[pin_project]
pub struct DrainFuture<F, B, E> {
    #[pin]
    kind: FutureKind<F, B, E>,
    _guard: Option<InFlightGuard>,
}

#[pin_project(project = FutureKindProj)]
enum FutureKind<F, B, E> {
    Inner(#[pin] F),
    Rejected(Option<Result<Response<B>, E>>),
}

impl<F, B, E> Future for DrainFuture<F, B, E>
where
    F: Future<Output = Result<Response<B>, E>>,
    B: Body,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        match this.kind.project() {
            FutureKindProj::Inner(fut) => {
                let result = fut.poll(cx);
                if result.is_ready() {
                    this._guard.take();
                }
                result
            }
            FutureKindProj::Rejected(response) => Poll::Ready(
                response
                    .take()
                    .expect("rejected response polled after completion"),
            ),
        }
    }
}
