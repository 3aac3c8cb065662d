use std::sync::Arc;

use anyhow::Result;
use hyper::server::conn::Http;
use hyper::Body;
use routerify::{RequestServiceBuilder, Router};
use tokio::net::TcpSocket;

use self::error::RouteError;
use crate::global::GlobalState;

pub mod auth;
pub mod error;
pub mod ext;
pub mod jwt;
pub mod macros;
pub mod middleware;
pub mod routes;

pub fn router(global: &Arc<GlobalState>) -> Router<Body, RouteError> {
	// The router holds a Weak reference so open keep-alive connections do
	// not keep the global state alive past shutdown.
	let weak = Arc::downgrade(global);

	Router::builder()
		.data(weak)
		.err_handler_with_info(error::error_handler)
		// The auth middleware checks the Authorization header, and if it's
		// valid, it attaches the user to the request context. Routes that
		// require authentication reject on their own when it is absent.
		.middleware(middleware::auth::auth_middleware(global))
		// The CORS middleware adds the CORS headers to the response
		.middleware(middleware::cors::cors_middleware(global))
		.scope("/auth", routes::auth::routes(global))
		.scope("/videos", routes::videos::routes(global))
		.scope("/channels", routes::channels::routes(global))
		.scope("/health", routes::health::routes(global))
		.any(routes::not_found)
		.build()
		.expect("failed to build router")
}

pub async fn run(global: Arc<GlobalState>) -> Result<()> {
	let config = &global.config.api;

	tracing::info!("listening on http://{}", config.bind_address);

	let socket = if config.bind_address.is_ipv6() {
		TcpSocket::new_v6()?
	} else {
		TcpSocket::new_v4()?
	};

	socket.set_reuseaddr(true)?;
	socket.set_reuseport(true)?;
	socket.bind(config.bind_address)?;
	let listener = socket.listen(1024)?;

	let request_service = RequestServiceBuilder::new(router(&global)).expect("failed to build request service");

	loop {
		let (socket, addr) = listener.accept().await?;

		let service = request_service.build(addr);

		tracing::debug!("accepted connection from {}", addr);

		tokio::spawn(async move {
			Http::new().serve_connection(socket, service).await.ok();
		});
	}
}
