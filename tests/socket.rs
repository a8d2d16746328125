//! Drives the `/ws` endpoint over a real socket, the way the web client does.

mod common;

use std::{net::SocketAddr, time::Duration};

use common::state;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use snappy::{app, AppState};
use tokio::{
    net::{TcpListener, TcpStream},
    time::{sleep, timeout},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve() -> (AppState, SocketAddr) {
    let state = state().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (state, addr)
}

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    socket
}

async fn emit(socket: &mut Socket, event: Value) {
    socket.send(Message::text(event.to_string())).await.unwrap();
}

async fn eventually(mut check: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !check() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never held");
}

async fn add_user(state: &AppState, socket: &mut Socket, user_id: &str) {
    emit(socket, json!({ "event": "add-user", "data": user_id })).await;
    eventually(|| state.relay.registry().is_live(user_id)).await;
}

async fn send_msg(socket: &mut Socket, from: &str, to: &str, msg: &str) {
    emit(socket, json!({ "event": "send-msg", "data": { "to": to, "from": from, "msg": msg } })).await;
}

async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("no frame arrived")
            .expect("socket ended")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(socket: &mut Socket) {
    let extra = timeout(Duration::from_millis(200), socket.next()).await;
    assert!(extra.is_err(), "unexpected frame: {extra:?}");
}

async fn history(addr: SocketAddr, from: &str, to: &str) -> Vec<Value> {
    reqwest::Client::new()
        .post(format!("http://{addr}/api/messages/getmsg"))
        .json(&json!({ "from": from, "to": to }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn add_user_then_send_msg_reaches_the_other_socket() {
    let (state, addr) = serve().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    add_user(&state, &mut a, "u1").await;
    add_user(&state, &mut b, "u2").await;

    send_msg(&mut a, "u1", "u2", "hi").await;

    assert_eq!(next_event(&mut b).await, json!({ "event": "msg-recieve", "data": "hi" }));
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn web_client_send_is_pushed_once_and_stored_once() {
    let (state, addr) = serve().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    add_user(&state, &mut a, "u1").await;
    add_user(&state, &mut b, "u2").await;

    // the web client emits on the socket, then appends over REST
    send_msg(&mut a, "u1", "u2", "hi").await;
    let reply = reqwest::Client::new()
        .post(format!("http://{addr}/api/messages/addmsg"))
        .json(&json!({ "from": "u1", "to": "u2", "message": "hi" }))
        .send()
        .await
        .unwrap();
    assert!(reply.status().is_success());

    assert_eq!(next_event(&mut b).await, json!({ "event": "msg-recieve", "data": "hi" }));
    assert_silent(&mut b).await;
    assert_eq!(history(addr, "u2", "u1").await, [json!({ "fromSelf": false, "message": "hi" })]);
}

#[tokio::test]
async fn garbage_frames_do_not_end_the_socket() {
    let (state, addr) = serve().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    add_user(&state, &mut a, "u1").await;
    add_user(&state, &mut b, "u2").await;

    a.send(Message::text("not json")).await.unwrap();
    a.send(Message::binary(vec![0xff, 0x00, 0x13])).await.unwrap();
    emit(&mut a, json!({ "event": "typing", "data": "u1" })).await;
    emit(&mut a, json!({ "event": "add-user", "data": "" })).await;
    send_msg(&mut a, "u1", "u2", "still here").await;

    assert_eq!(next_event(&mut b).await["data"], "still here");
    assert!(state.relay.registry().is_live("u1"));
}

#[tokio::test]
async fn second_add_user_rebinds_the_socket() {
    let (state, addr) = serve().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    add_user(&state, &mut a, "u1").await;
    add_user(&state, &mut b, "u2").await;

    add_user(&state, &mut b, "u3").await;
    eventually(|| !state.relay.registry().is_live("u2")).await;

    send_msg(&mut a, "u1", "u2", "old name").await;
    send_msg(&mut a, "u1", "u3", "new name").await;

    assert_eq!(next_event(&mut b).await["data"], "new name");
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn closing_the_socket_releases_the_user() {
    let (state, addr) = serve().await;
    let mut a = connect(addr).await;
    add_user(&state, &mut a, "u1").await;

    a.close(None).await.unwrap();

    eventually(|| !state.relay.registry().is_live("u1")).await;
    assert!(state.relay.registry().is_empty());
}
