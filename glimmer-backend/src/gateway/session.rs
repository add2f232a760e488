use crate::controllers::identity_from_request;
use crate::gateway::methods;
use crate::gateway::protocol::{GatewayEvent, RpcError, RpcRequest, RpcResponse};
use crate::gateway::registry::{ConnectionRegistry, CONNECTION_BUFFER};
use crate::relay::Relay;
use crate::AppState;
use actix_web::{rt, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Per-connection state seen by the RPC methods
pub struct SessionContext {
    pub conn_id: String,
    /// Set once the connection has authenticated
    pub user_id: Option<String>,
    /// Handed to the registry on authentication. The registry then owns the
    /// only sender, so evicting the connection closes its event channel.
    events: Option<mpsc::Sender<GatewayEvent>>,
}

impl SessionContext {
    pub fn new(events: mpsc::Sender<GatewayEvent>) -> Self {
        Self {
            conn_id: Uuid::new_v4().to_string(),
            user_id: None,
            events: Some(events),
        }
    }

    /// Take the sender side of this connection's event channel
    pub fn take_events(&mut self) -> Option<mpsc::Sender<GatewayEvent>> {
        self.events.take()
    }
}

/// `GET /ws`: upgrade and hand the socket to its own task
pub async fn ws_handler(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;
    let user_hint = identity_from_request(&req);
    let heartbeat = Duration::from_secs(state.config.ws_heartbeat_secs);
    let timeout = Duration::from_secs(state.config.ws_client_timeout_secs);

    log::debug!(
        "[GATEWAY] WebSocket upgrade from {:?}",
        req.connection_info().peer_addr()
    );
    rt::spawn(run_session(
        state.relay.clone(),
        session,
        msg_stream,
        user_hint,
        heartbeat,
        timeout,
    ));

    Ok(response)
}

async fn run_session(
    relay: Arc<Relay>,
    mut session: Session,
    mut msg_stream: MessageStream,
    user_hint: Option<String>,
    heartbeat: Duration,
    timeout: Duration,
) {
    let (event_tx, mut event_rx) = ConnectionRegistry::channel();
    let mut ctx = SessionContext::new(event_tx);

    if let Some(user_id) = user_hint {
        if let Err(e) = methods::authenticate(&relay, &mut ctx, &user_id) {
            log::warn!("[GATEWAY] Ignoring identity header {:?}: {}", user_id, e.message);
        }
    }

    // Channel for RPC responses, written by the reader loop below
    let (tx, mut rx) = mpsc::channel::<String>(CONNECTION_BUFFER);

    // Task to forward responses and events to the socket. It ends when the
    // registry evicts the connection, which also ends the session.
    let mut sink = session.clone();
    let mut send_task = rt::spawn(async move {
        loop {
            tokio::select! {
                Some(text) = rx.recv() => {
                    if sink.text(text).await.is_err() {
                        break;
                    }
                }
                event = event_rx.recv() => {
                    let Some(event) = event else { break };
                    if let Ok(json) = serde_json::to_string(&event) {
                        if sink.text(json).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    let mut last_seen = Instant::now();
    let mut ticker = tokio::time::interval(heartbeat);

    let close_reason = loop {
        tokio::select! {
            frame = msg_stream.next() => {
                let Some(frame) = frame else { break None };
                last_seen = Instant::now();
                match frame {
                    Ok(Message::Text(text)) => {
                        let response = process_request(&text, &mut ctx, &relay).await;
                        if let Ok(json) = serde_json::to_string(&response) {
                            if tx.send(json).await.is_err() {
                                break None;
                            }
                        }
                    }
                    Ok(Message::Binary(_)) => {
                        let response = RpcResponse::error(String::new(), RpcError::invalid_request());
                        if let Ok(json) = serde_json::to_string(&response) {
                            let _ = tx.send(json).await;
                        }
                    }
                    Ok(Message::Ping(bytes)) => {
                        if session.pong(&bytes).await.is_err() {
                            break None;
                        }
                    }
                    Ok(Message::Close(reason)) => break reason,
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("[GATEWAY] Protocol error on {}: {}", ctx.conn_id, e);
                        break None;
                    }
                }
            }
            _ = &mut send_task => {
                log::info!("[GATEWAY] Connection {} evicted or unwritable", ctx.conn_id);
                break None;
            }
            _ = ticker.tick() => {
                if last_seen.elapsed() > timeout {
                    log::info!("[GATEWAY] Connection {} timed out", ctx.conn_id);
                    break None;
                }
                if session.ping(b"").await.is_err() {
                    break None;
                }
            }
        }
    };

    // Cleanup
    if let Some(user_id) = ctx.user_id.as_deref() {
        relay.gateway().disconnect(user_id, &ctx.conn_id);
    }
    send_task.abort();
    let _ = session.close(close_reason).await;
    log::debug!("[GATEWAY] Connection {} closed", ctx.conn_id);
}

pub(crate) async fn process_request(text: &str, ctx: &mut SessionContext, relay: &Relay) -> RpcResponse {
    // Parse the request
    let request: RpcRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(_) => {
            return RpcResponse::error(String::new(), RpcError::parse_error());
        }
    };

    let id = request.id.clone();

    // Dispatch to handler
    match dispatch_method(&request, ctx, relay).await {
        Ok(value) => RpcResponse::success(id, value),
        Err(error) => {
            log::debug!("[GATEWAY] {} failed: {}", request.method, error.message);
            RpcResponse::error(id, error)
        }
    }
}

async fn dispatch_method(
    request: &RpcRequest,
    ctx: &mut SessionContext,
    relay: &Relay,
) -> Result<serde_json::Value, RpcError> {
    let params = &request.params;
    match request.method.as_str() {
        "ping" => return methods::handle_ping().await,
        "auth" => return methods::handle_auth(params, relay, ctx).await,
        _ => {}
    }

    let Some(user_id) = ctx.user_id.clone() else {
        return Err(if is_known_method(&request.method) {
            RpcError::not_authenticated()
        } else {
            RpcError::method_not_found()
        });
    };
    let user_id = user_id.as_str();
    if !relay.gateway().registry().is_registered(user_id, &ctx.conn_id) {
        return Err(RpcError::not_authenticated());
    }

    match request.method.as_str() {
        "status" => methods::handle_status(relay, ctx).await,
        "chat.send" => methods::handle_chat_send(params, relay, user_id, &ctx.conn_id).await,
        "chat.typing" => methods::handle_chat_typing(params, relay, user_id).await,
        "game.move" => methods::handle_game_move(params, relay, user_id).await,
        "game.forfeit" => methods::handle_game_forfeit(params, relay, user_id).await,
        "game.get" => methods::handle_game_get(params, relay, user_id).await,
        "room.join" => methods::handle_room_join(params, relay, user_id).await,
        "room.leave" => methods::handle_room_leave(params, relay, user_id).await,
        "room.send" => methods::handle_room_send(params, relay, user_id).await,
        "presence.watch" => methods::handle_presence_watch(params, relay, user_id).await,
        "presence.unwatch" => methods::handle_presence_unwatch(params, relay, user_id).await,
        _ => Err(RpcError::method_not_found()),
    }
}

fn is_known_method(method: &str) -> bool {
    matches!(
        method,
        "status"
            | "chat.send"
            | "chat.typing"
            | "game.move"
            | "game.forfeit"
            | "game.get"
            | "room.join"
            | "room.leave"
            | "room.send"
            | "presence.watch"
            | "presence.unwatch"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::protocol::codes;
    use crate::relay::test_support::{drain, relay};
    use serde_json::json;

    fn session() -> (SessionContext, mpsc::Receiver<GatewayEvent>) {
        let (tx, rx) = ConnectionRegistry::channel();
        (SessionContext::new(tx), rx)
    }

    async fn call(ctx: &mut SessionContext, relay: &Relay, method: &str, params: serde_json::Value) -> RpcResponse {
        let text = json!({"id": "1", "method": method, "params": params}).to_string();
        process_request(&text, ctx, relay).await
    }

    #[actix_web::test]
    async fn test_requires_auth() {
        let relay = relay();
        let (mut ctx, _rx) = session();

        let pong = call(&mut ctx, &relay, "ping", json!(null)).await;
        assert_eq!(pong.result, Some(json!("pong")));

        let denied = call(&mut ctx, &relay, "chat.send", json!({"receiver_id": "ben", "content": "hi"})).await;
        assert_eq!(denied.error.map(|e| e.code), Some(codes::NOT_AUTHENTICATED));

        let unknown = call(&mut ctx, &relay, "agent.run", json!({})).await;
        assert_eq!(unknown.error.map(|e| e.code), Some(codes::METHOD_NOT_FOUND));

        let garbage = process_request("{not json", &mut ctx, &relay).await;
        assert_eq!(garbage.error.map(|e| e.code), Some(codes::PARSE_ERROR));
    }

    #[actix_web::test]
    async fn test_auth_then_chat() {
        let relay = relay();
        let (mut ana, _ana_rx) = session();
        let (mut ben, mut ben_rx) = session();

        let auth = call(&mut ana, &relay, "auth", json!({"user_id": "ana"})).await;
        assert_eq!(auth.result.unwrap()["user_id"], "ana");
        call(&mut ben, &relay, "auth", json!({"userId": "ben"})).await;
        assert!(relay.gateway().is_online("ana"));

        // Switching identity on an authenticated connection is refused
        let switch = call(&mut ana, &relay, "auth", json!({"user_id": "mallory"})).await;
        assert_eq!(switch.error.map(|e| e.code), Some(codes::INVALID_REQUEST));

        let sent = call(&mut ana, &relay, "chat.send", json!({"receiver_id": "ben", "content": "hi"})).await;
        let result = sent.result.expect("send result");
        assert_eq!(result["delivered"], 1);
        assert_eq!(result["message"]["senderId"], "ana");

        let events = drain(&mut ben_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["content"], "hi");

        let bad = call(&mut ana, &relay, "chat.send", json!({"content": "no receiver"})).await;
        assert_eq!(bad.error.map(|e| e.code), Some(codes::INVALID_PARAMS));
    }

    #[actix_web::test]
    async fn test_presence_and_rooms_over_rpc() {
        let relay = relay();
        let (mut ana, mut ana_rx) = session();
        let (mut ben, _ben_rx) = session();
        call(&mut ana, &relay, "auth", json!({"user_id": "ana"})).await;

        let watch = call(&mut ana, &relay, "presence.watch", json!({"user_ids": ["ben"]})).await;
        assert_eq!(watch.result.unwrap()["online"]["ben"], false);

        call(&mut ben, &relay, "auth", json!({"user_id": "ben"})).await;
        let events = drain(&mut ana_rx);
        assert_eq!(events[0].event, "presence.changed");

        call(&mut ana, &relay, "room.join", json!({"room_id": "moon"})).await;
        let joined = call(&mut ben, &relay, "room.join", json!({"room_id": "moon"})).await;
        assert_eq!(joined.result.unwrap()["members"], json!(["ana", "ben"]));
        let sent = call(&mut ben, &relay, "room.send", json!({"room_id": "moon", "content": "hey"})).await;
        assert_eq!(sent.result.unwrap()["delivered"], 1);

        let names: Vec<_> = drain(&mut ana_rx).into_iter().map(|e| e.event).collect();
        assert_eq!(names, vec!["room.member_joined", "room.message"]);

        relay.gateway().disconnect("ben", &ben.conn_id);
        let names: Vec<_> = drain(&mut ana_rx).into_iter().map(|e| e.event).collect();
        assert_eq!(names, vec!["room.member_left", "presence.changed"]);
    }

    #[actix_web::test]
    async fn test_game_methods() {
        let relay = relay();
        let (mut ana, _ana_rx) = session();
        call(&mut ana, &relay, "auth", json!({"user_id": "ana"})).await;
        let game = relay.create_game("ana", "ben", "tic-tac-toe").unwrap();

        let moved = call(
            &mut ana,
            &relay,
            "game.move",
            json!({"game_id": game.id, "move": {"cell": 4}, "expected_move": 0}),
        )
        .await;
        assert_eq!(moved.result.unwrap()["moveCount"], 1);

        let again = call(&mut ana, &relay, "game.move", json!({"game_id": game.id, "move": {"cell": 5}})).await;
        assert_eq!(again.error.map(|e| e.code), Some(codes::CONFLICT));

        let missing = call(&mut ana, &relay, "game.get", json!({"game_id": "nope"})).await;
        assert_eq!(missing.error.map(|e| e.code), Some(codes::NOT_FOUND));

        let forfeit = call(&mut ana, &relay, "game.forfeit", json!({"gameId": game.id})).await;
        assert_eq!(forfeit.result.unwrap()["status"], "abandoned");
    }

    #[actix_web::test]
    async fn test_evicted_connection_is_refused() {
        let relay = relay();
        let (mut ana, _ana_rx) = session();
        call(&mut ana, &relay, "auth", json!({"user_id": "ana"})).await;

        for _ in 0..=CONNECTION_BUFFER {
            relay.gateway().send_to_user("ana", &GatewayEvent::presence_changed("ben", true));
        }
        assert!(!relay.gateway().is_online("ana"));

        let joined = call(&mut ana, &relay, "room.join", json!({"room_id": "moon"})).await;
        assert_eq!(joined.error.map(|e| e.code), Some(codes::NOT_AUTHENTICATED));
        let watch = call(&mut ana, &relay, "presence.watch", json!({"user_ids": ["ben"]})).await;
        assert!(watch.error.is_some());

        relay.gateway().disconnect("ana", &ana.conn_id);
        assert!(relay.gateway().rooms().members("moon").is_empty());
        assert!(relay.gateway().presence().watchers_of("ben").is_empty());
    }

    mod socket {
        use super::super::ws_handler;
        use crate::config::Config;
        use crate::controllers::IDENTITY_HEADER;
        use crate::db::Database;
        use crate::gateway::protocol::codes;
        use crate::gateway::ConnectionRegistry;
        use crate::AppState;
        use actix_web::{rt, web, App, HttpServer};
        use futures_util::{SinkExt, StreamExt};
        use serde_json::{json, Value};
        use std::sync::Arc;
        use std::time::Duration;
        use tokio::net::TcpStream;
        use tokio_tungstenite::tungstenite::client::IntoClientRequest;
        use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
        use tokio_tungstenite::tungstenite::Message as WsMessage;
        use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

        type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

        /// Serve `/ws` on an ephemeral port and return the shared state and its URL
        fn serve(config: Config) -> (web::Data<AppState>, String) {
            let db = Arc::new(Database::new(":memory:").expect("in-memory db"));
            let state = web::Data::new(AppState::new(db, config));
            let app_state = state.clone();
            let server = HttpServer::new(move || {
                App::new()
                    .app_data(app_state.clone())
                    .route("/ws", web::get().to(ws_handler))
            })
            .workers(1)
            .bind(("127.0.0.1", 0))
            .expect("bind");
            let addr = server.addrs()[0];
            rt::spawn(server.run());
            (state, format!("ws://{}/ws", addr))
        }

        async fn connect_as(url: &str, user_id: &str) -> Socket {
            let mut request = url.into_client_request().expect("client request");
            request.headers_mut().insert(
                HeaderName::from_bytes(IDENTITY_HEADER.as_bytes()).expect("header name"),
                HeaderValue::from_str(user_id).expect("header value"),
            );
            let (socket, _) = tokio_tungstenite::connect_async(request).await.expect("connect");
            socket
        }

        async fn next_json(socket: &mut Socket) -> Value {
            while let Some(frame) = socket.next().await {
                if let WsMessage::Text(text) = frame.expect("frame") {
                    return serde_json::from_str(&text).expect("json frame");
                }
            }
            panic!("socket closed before a text frame arrived");
        }

        async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
            for _ in 0..160 {
                if check() {
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            false
        }

        #[actix_web::test]
        async fn test_socket_lifecycle() {
            let (state, url) = serve(Config::default());
            let (ana_tx, mut ana_rx) = ConnectionRegistry::channel();
            state.gateway.connect("ana", "a1", ana_tx);
            state.gateway.presence().watch("ana", &["ben".to_string()]);

            let mut socket = connect_as(&url, "ben").await;
            assert!(wait_until(|| state.gateway.is_online("ben")).await);
            let online = tokio::time::timeout(Duration::from_secs(5), ana_rx.recv())
                .await
                .expect("online notice in time")
                .expect("online notice");
            assert_eq!(online.data["online"], true);

            socket
                .send(WsMessage::Text(json!({"id": "7", "method": "ping"}).to_string()))
                .await
                .expect("send ping");
            let reply = next_json(&mut socket).await;
            assert_eq!(reply["type"], "response");
            assert_eq!(reply["id"], "7");
            assert_eq!(reply["result"], "pong");

            socket.send(WsMessage::Binary(vec![1, 2, 3])).await.expect("send binary");
            let reply = next_json(&mut socket).await;
            assert_eq!(reply["error"]["code"], codes::INVALID_REQUEST);

            socket.close(None).await.expect("close");
            assert!(wait_until(|| !state.gateway.is_online("ben")).await);
            let offline = tokio::time::timeout(Duration::from_secs(5), ana_rx.recv())
                .await
                .expect("offline notice in time")
                .expect("offline notice");
            assert_eq!(offline.data["userId"], "ben");
            assert_eq!(offline.data["online"], false);
        }

        #[actix_web::test]
        async fn test_silent_client_times_out() {
            let (state, url) = serve(Config {
                ws_heartbeat_secs: 1,
                ws_client_timeout_secs: 1,
                ..Config::default()
            });

            // Never polled, so the client answers no pings
            let _socket = connect_as(&url, "ben").await;
            assert!(wait_until(|| state.gateway.is_online("ben")).await);
            assert!(wait_until(|| !state.gateway.is_online("ben")).await);
        }
    }
}
