//! HTTP server for receiving UPnP event notifications.

use bytes::Bytes;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use warp::http::{Method, StatusCode};
use warp::Filter;

use crate::error::{CallbackServerError, Result};
use crate::router::{EventRouter, NotificationPayload};

/// HTTP callback server for UPnP `NOTIFY` requests.
///
/// Every path is accepted; devices are told the bare base URL. Requests are
/// validated, then routed by their `SID` header.
pub struct CallbackServer {
    port: u16,
    base_url: String,
    event_router: Arc<EventRouter>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Start a server on the first free port in `port_range`, advertising the
    /// address of the interface used for outbound traffic.
    pub async fn new(
        port_range: (u16, u16),
        event_sender: mpsc::UnboundedSender<NotificationPayload>,
    ) -> Result<Self> {
        let local_ip = detect_local_ip().ok_or(CallbackServerError::LocalIpUnavailable)?;
        Self::bind(port_range, local_ip, event_sender).await
    }

    /// Start a server on the first free port in `port_range` and advertise
    /// `advertised_ip` in the callback URL.
    ///
    /// A range of `(0, 0)` lets the OS pick the port.
    pub async fn bind(
        port_range: (u16, u16),
        advertised_ip: IpAddr,
        event_sender: mpsc::UnboundedSender<NotificationPayload>,
    ) -> Result<Self> {
        let (start, end) = port_range;
        let event_router = Arc::new(EventRouter::new(event_sender));
        let routes = notify_route(event_router.clone()).recover(handle_rejection);

        for port in start..=end {
            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            let bound = warp::serve(routes.clone()).try_bind_with_graceful_shutdown(
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
                async move {
                    let _ = shutdown_rx.await;
                },
            );

            let (addr, server) = match bound {
                Ok(bound) => bound,
                Err(e) => {
                    tracing::trace!(port, error = %e, "callback port unavailable");
                    continue;
                }
            };

            let base_url = format!("http://{advertised_ip}:{}", addr.port());
            tracing::info!(%addr, %base_url, "callback server listening");

            return Ok(Self {
                port: addr.port(),
                base_url,
                event_router,
                shutdown_tx: Some(shutdown_tx),
                server_handle: Some(tokio::spawn(server)),
            });
        }

        Err(CallbackServerError::NoAvailablePort { start, end })
    }

    /// Callback URL to hand to devices when subscribing, `http://<ip>:<port>`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Router used to register and unregister subscription IDs
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.event_router
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "callback server task ended abnormally");
            }
        }
        tracing::debug!(port = self.port, "callback server stopped");
    }
}

/// Local address used for outbound traffic. No packet is sent; connecting a
/// UDP socket only selects a route.
fn detect_local_ip() -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip())
}

fn notify_route(
    router: Arc<EventRouter>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::method()
        .and(warp::header::optional::<String>("sid"))
        .and(warp::header::optional::<String>("nt"))
        .and(warp::header::optional::<String>("nts"))
        .and(warp::body::bytes())
        .and_then(
            move |method: Method,
                  sid: Option<String>,
                  nt: Option<String>,
                  nts: Option<String>,
                  body: Bytes| {
                let router = router.clone();
                async move { handle_notify(&router, method, sid, nt, nts, body) }
            },
        )
}

fn handle_notify(
    router: &EventRouter,
    method: Method,
    sid: Option<String>,
    nt: Option<String>,
    nts: Option<String>,
    body: Bytes,
) -> std::result::Result<warp::reply::WithStatus<&'static str>, warp::Rejection> {
    if method.as_str() != "NOTIFY" {
        return Err(warp::reject::not_found());
    }

    if !validate_upnp_headers(&sid, &nt, &nts) {
        tracing::debug!(?sid, ?nt, ?nts, "rejecting NOTIFY with invalid headers");
        return Err(warp::reject::custom(InvalidUpnpHeaders));
    }
    let subscription_id = sid.ok_or_else(|| warp::reject::custom(InvalidUpnpHeaders))?;

    tracing::trace!(sid = %subscription_id, bytes = body.len(), "NOTIFY received");

    let event_xml = String::from_utf8_lossy(&body).into_owned();
    if router.route_event(subscription_id.clone(), event_xml) {
        Ok(warp::reply::with_status("", StatusCode::OK))
    } else {
        tracing::debug!(sid = %subscription_id, "NOTIFY for unknown subscription");
        Err(warp::reject::custom(UnknownSubscription))
    }
}

/// `SID` is required. `NT`/`NTS`, when both present, must be the GENA
/// property-change values.
fn validate_upnp_headers(sid: &Option<String>, nt: &Option<String>, nts: &Option<String>) -> bool {
    if sid.is_none() {
        return false;
    }

    match (nt, nts) {
        (Some(nt), Some(nts)) => nt == "upnp:event" && nts == "upnp:propchange",
        _ => true,
    }
}

#[derive(Debug)]
struct InvalidUpnpHeaders;

impl warp::reject::Reject for InvalidUpnpHeaders {}

#[derive(Debug)]
struct UnknownSubscription;

impl warp::reject::Reject for UnknownSubscription {}

async fn handle_rejection(err: warp::Rejection) -> std::result::Result<impl warp::Reply, Infallible> {
    let (code, message) = if err.find::<InvalidUpnpHeaders>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid UPnP headers")
    } else if err.find::<UnknownSubscription>().is_some() {
        // GENA answers events for unknown SIDs with 412
        (StatusCode::PRECONDITION_FAILED, "Subscription not found")
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(warp::reply::with_status(message, code))
}
