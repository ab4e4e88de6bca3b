//! Native HTTP server
//!
//! Owns the listening socket and the lifecycle state machine:
//! `Unconfigured -> Initialized` on [`SimpleServer::initialize`],
//! `Initialized -> Running` on [`SimpleServer::start`] and back on
//! [`SimpleServer::stop`].
//!
//! Each accepted connection runs hyper's HTTP/1 driver in its own task.
//! Requests pass the middleware chain (the Basic-auth gate when access is
//! restricted) and are then dispatched on the blocking pool.

use crate::middleware::{AccessGate, BasicAuth, MiddlewareChain, REALM};
use crate::{
    ConnectionParameters, Dispatcher, Request, Response, Result, RouteTable, Settings,
    StateError,
};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::fmt;
use std::future::poll_fn;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::task::Poll;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Unconfigured,
    Initialized,
    Running,
}

/// Validated configuration stored by `initialize`
#[derive(Debug, Clone)]
struct Site {
    port: u16,
    gate: Option<AccessGate>,
    routes: Arc<RouteTable>,
}

/// Listening socket, shared by the accept loop and `stop`
///
/// The accept loop only borrows the socket while polling it, so whoever
/// takes it out of the slot holds the last reference.
type SocketSlot = Arc<Mutex<Option<TcpListener>>>;

/// Handles of a bound, serving listener
struct Listener {
    local_addr: SocketAddr,
    socket: SocketSlot,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Listener {
    /// Release the port before returning, then abort the accept loop and
    /// its in-flight connections without draining
    fn close(self) {
        drop(self.socket.lock().take());
        let _ = self.shutdown_tx.send(());
        self.task.abort();
    }
}

enum Lifecycle {
    Unconfigured,
    Initialized(Site),
    Running(Site, Listener),
}

impl Lifecycle {
    fn state(&self) -> ServerState {
        match self {
            Lifecycle::Unconfigured => ServerState::Unconfigured,
            Lifecycle::Initialized(_) => ServerState::Initialized,
            Lifecycle::Running(..) => ServerState::Running,
        }
    }

    fn site(&self) -> Option<&Site> {
        match self {
            Lifecycle::Unconfigured => None,
            Lifecycle::Initialized(site) | Lifecycle::Running(site, _) => Some(site),
        }
    }
}

/// Canned-response HTTP server
///
/// Lifecycle calls are serialised by an internal lock, so the server may be
/// shared between tasks. `start` must be called from within a tokio runtime.
pub struct SimpleServer {
    lifecycle: Mutex<Lifecycle>,
}

impl SimpleServer {
    /// Create an unconfigured server
    pub fn new() -> Self {
        Self {
            lifecycle: Mutex::new(Lifecycle::Unconfigured),
        }
    }

    /// Load a settings file and initialize a server from it
    pub fn from_settings_file(path: impl AsRef<Path>) -> Result<Self> {
        let (params, routes) = Settings::from_file(path)?.into_parts();
        let server = Self::new();
        server.initialize(params, routes)?;
        Ok(server)
    }

    /// Validate connection parameters and store the route table
    ///
    /// Fails with [`crate::ConfigError::InvalidPort`] for ports outside
    /// `1025..=65535` and [`crate::ConfigError::MissingField`] when access is
    /// restricted but user or password is absent. The state is left
    /// unchanged on failure.
    pub fn initialize(&self, params: ConnectionParameters, routes: RouteTable) -> Result<()> {
        let port = params.checked_port()?;
        let gate = params.access_gate()?;

        let mut lifecycle = self.lifecycle.lock();
        if let Lifecycle::Running(..) = *lifecycle {
            return Err(StateError::AlreadyRunning.into());
        }

        tracing::debug!(
            port,
            open_access = gate.is_none(),
            routes = routes.len(),
            "server initialized"
        );
        *lifecycle = Lifecycle::Initialized(Site {
            port,
            gate,
            routes: Arc::new(routes),
        });
        Ok(())
    }

    /// Bind the configured port and start serving
    ///
    /// A no-op when already running.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        let site = match &*lifecycle {
            Lifecycle::Unconfigured => return Err(StateError::NotInitialized.into()),
            Lifecycle::Running(..) => return Ok(()),
            Lifecycle::Initialized(site) => site.clone(),
        };

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, site.port));
        let listener = {
            let _enter = runtime.enter();
            TcpListener::from_std(create_listener_socket(&addr)?.into())?
        };
        let local_addr = listener.local_addr()?;

        let socket: SocketSlot = Arc::new(Mutex::new(Some(listener)));
        let service = Arc::new(Service::new(&site));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = runtime.spawn(accept_loop(socket.clone(), service, shutdown_rx));

        tracing::info!(%local_addr, open_access = site.gate.is_none(), "server started");
        *lifecycle = Lifecycle::Running(
            site,
            Listener {
                local_addr,
                socket,
                shutdown_tx,
                task,
            },
        );
        Ok(())
    }

    /// Close the listener immediately, without draining in-flight requests
    ///
    /// The port is released by the time this returns.
    pub fn stop(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Unconfigured) {
            Lifecycle::Running(site, listener) => {
                let local_addr = listener.local_addr;
                listener.close();
                *lifecycle = Lifecycle::Initialized(site);
                tracing::info!(%local_addr, "server stopped");
                Ok(())
            }
            other => {
                *lifecycle = other;
                Err(StateError::NotRunning.into())
            }
        }
    }

    pub fn state(&self) -> ServerState {
        self.lifecycle.lock().state()
    }

    pub fn is_initialized(&self) -> bool {
        self.state() != ServerState::Unconfigured
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServerState::Running
    }

    /// Whether requests bypass authentication; false until initialized
    pub fn is_open_access(&self) -> bool {
        self.lifecycle
            .lock()
            .site()
            .map_or(false, |site| site.gate.is_none())
    }

    /// Configured port, once initialized
    pub fn port(&self) -> Option<u16> {
        self.lifecycle.lock().site().map(|site| site.port)
    }

    /// Address actually bound, while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.lifecycle.lock() {
            Lifecycle::Running(_, listener) => Some(listener.local_addr),
            _ => None,
        }
    }
}

impl Default for SimpleServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimpleServer {
    fn drop(&mut self) {
        let lifecycle = std::mem::replace(self.lifecycle.get_mut(), Lifecycle::Unconfigured);
        if let Lifecycle::Running(_, listener) = lifecycle {
            listener.close();
        }
    }
}

impl fmt::Display for SimpleServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lifecycle = self.lifecycle.lock();
        let performed = |yes: bool| if yes { "performed" } else { "not performed" };

        writeln!(f, "Server state:")?;
        writeln!(f, "- initialization {};", performed(lifecycle.site().is_some()))?;
        writeln!(f, "- start {};", performed(lifecycle.state() == ServerState::Running))?;
        match lifecycle.site() {
            Some(site) => {
                let access = if site.gate.is_none() { "allowed" } else { "denied" };
                writeln!(f, "- access for all users {};", access)?;
                write!(f, "- port listening: {};", site.port)
            }
            None => {
                writeln!(f, "- access for all users denied;")?;
                write!(f, "- no port available;")
            }
        }
    }
}

impl fmt::Debug for SimpleServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleServer")
            .field("state", &self.state())
            .field("port", &self.port())
            .finish()
    }
}

/// Per-listener request handling shared by all connections
struct Service {
    middleware: MiddlewareChain,
    dispatcher: Dispatcher,
}

impl Service {
    fn new(site: &Site) -> Self {
        let mut middleware = MiddlewareChain::new();
        if let Some(gate) = &site.gate {
            middleware.add(BasicAuth::new(REALM, gate.clone()));
        }
        tracing::debug!(middlewares = middleware.len(), "request pipeline ready");
        Self {
            middleware,
            dispatcher: Dispatcher::new(site.routes.clone()),
        }
    }

    async fn handle(&self, req: Request) -> Response {
        if let Some(res) = self.middleware.run_before(&req) {
            return res;
        }

        let dispatcher = self.dispatcher.clone();
        match tokio::task::spawn_blocking(move || dispatcher.handle(&req)).await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = %err, "dispatch task failed");
                Response::internal_error("Internal Server Error")
            }
        }
    }
}

/// Accept the next connection, or `None` once the socket has been taken
async fn accept(socket: &SocketSlot) -> Option<std::io::Result<(TcpStream, SocketAddr)>> {
    poll_fn(|cx| match socket.lock().as_ref() {
        Some(listener) => listener.poll_accept(cx).map(Some),
        None => Poll::Ready(None),
    })
    .await
}

async fn accept_loop(
    socket: SocketSlot,
    service: Arc<Service>,
    shutdown_rx: oneshot::Receiver<()>,
) {
    // Dropping the set on exit aborts every in-flight connection.
    let mut connections = JoinSet::new();

    tokio::select! {
        _ = async {
            loop {
                let (stream, peer) = match accept(&socket).await {
                    Some(Ok(conn)) => conn,
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "accept failed");
                        continue;
                    }
                    None => break,
                };

                while connections.try_join_next().is_some() {}
                connections.spawn(serve_connection(stream, peer, service.clone()));
            }
        } => {}
        _ = shutdown_rx => {}
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, service: Arc<Service>) {
    let io = TokioIo::new(stream);
    let svc = service_fn(move |req| {
        let service = service.clone();
        async move {
            let req = from_hyper_request(&req);
            let (method, target) = (req.method.clone(), req.target.clone());
            let res = service.handle(req).await;
            tracing::debug!(%peer, %method, %target, status = %res.status, "request served");
            Ok::<_, Infallible>(res.into_hyper())
        }
    });

    if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
        tracing::debug!(%peer, error = %err, "connection error");
    }
}

/// Convert a hyper request to our Request type
///
/// The target is the request URI exactly as received.
pub fn from_hyper_request(req: &hyper::Request<Incoming>) -> Request {
    let mut request = Request::new(req.method().as_str(), req.uri().to_string());

    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    request
}

/// Create a listening TCP socket
pub fn create_listener_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;

    Ok(socket)
}
