// src/handlers/realtime.rs

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};

use crate::{
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Claims,
    realtime::{hub, RealtimeHub},
};

const OUTBOUND_BUFFER: usize = 128;
const MAX_ROOMS_PER_CONNECTION: usize = 64;

// Frames enviados pelo cliente
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientCommand {
    Join { room: String },
    Leave { room: String },
}

/// Salas de lead só da própria área (admin/gerente: todas).
/// Conversas e a caixa de entrada são abertas a qualquer autenticado.
pub fn can_join(claims: &Claims, room: &str) -> bool {
    if let Some(area) = hub::room_area(room) {
        return claims.can_access_area(area);
    }
    room == hub::INBOX_ROOM || room.strip_prefix("conversation:").is_some_and(|id| !id.is_empty())
}

// GET /api/realtime/ws
#[utoipa::path(
    get,
    path = "/api/realtime/ws",
    tag = "Realtime",
    responses(
        (status = 101, description = "Upgrade para WebSocket"),
        (status = 401, description = "Não autenticado")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn realtime_ws(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> impl IntoResponse {
    let hub = app_state.hub.clone();
    ws.on_upgrade(move |socket| handle_connection(socket, hub, user))
}

async fn handle_connection(socket: WebSocket, hub: RealtimeHub, user: Claims) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

    tracing::debug!("🔌 WebSocket aberto para {}", user.email);

    // Único escritor do socket
    let send_task = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Uma task de repasse por sala inscrita
    let mut subscriptions: HashMap<String, JoinHandle<()>> = HashMap::new();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(ClientCommand::Join { room }) => {
                        let room = hub::normalize_room(&room);
                        if !can_join(&user, &room) {
                            json!({ "event": "error", "room": room, "message": "forbidden" })
                        } else if !subscriptions.contains_key(&room) && subscriptions.len() >= MAX_ROOMS_PER_CONNECTION {
                            json!({ "event": "error", "room": room, "message": "too many rooms" })
                        } else {
                            if !subscriptions.contains_key(&room) {
                                let handle = forward_room(&hub, &room, out_tx.clone()).await;
                                subscriptions.insert(room.clone(), handle);
                                tracing::debug!(
                                    "{} entrou em '{}' ({} inscritos)",
                                    user.email,
                                    room,
                                    hub.subscriber_count(&room).await
                                );
                            }
                            json!({ "event": "joined", "room": room })
                        }
                    }
                    Ok(ClientCommand::Leave { room }) => {
                        let room = hub::normalize_room(&room);
                        if let Some(handle) = subscriptions.remove(&room) {
                            release_room(&hub, &room, handle).await;
                        }
                        json!({ "event": "left", "room": room })
                    }
                    Err(_) => json!({ "event": "error", "message": "invalid command" }),
                };
                if out_tx.send(reply.to_string()).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!("WebSocket de {} encerrado com erro: {}", user.email, e);
                break;
            }
            _ => {}
        }
    }

    for (room, handle) in subscriptions.drain() {
        release_room(&hub, &room, handle).await;
    }
    send_task.abort();
    tracing::debug!("🔌 WebSocket fechado para {} ({} salas ativas)", user.email, hub.room_count().await);
}

// Espera a task de repasse terminar para que o receiver já tenha sido solto
async fn release_room(hub: &RealtimeHub, room: &str, handle: JoinHandle<()>) {
    handle.abort();
    let _ = handle.await;
    hub.unsubscribe(room).await;
}

async fn forward_room(hub: &RealtimeHub, room: &str, out_tx: mpsc::Sender<String>) -> JoinHandle<()> {
    let mut rx = hub.subscribe(room).await;
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else { continue };
                    if out_tx.send(text).await.is_err() {
                        break;
                    }
                }
                // Entrega sem garantia: quem ficou para trás perde eventos
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Assinante atrasado perdeu {} eventos", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(role: &str, areas: &[&str]) -> Claims {
        Claims {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@estate.test".into(),
            role: role.into(),
            alloted_area: areas.iter().map(|a| a.to_string()).collect(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn parses_join_and_leave_frames() {
        let join: ClientCommand = serde_json::from_str(r#"{"action":"join","room":"goa|hot"}"#).unwrap();
        assert_eq!(join, ClientCommand::Join { room: "goa|hot".into() });

        let leave: ClientCommand = serde_json::from_str(r#"{"action":"leave","room":"whatsapp:inbox"}"#).unwrap();
        assert_eq!(leave, ClientCommand::Leave { room: "whatsapp:inbox".into() });

        assert!(serde_json::from_str::<ClientCommand>(r#"{"action":"shout","room":"x"}"#).is_err());
    }

    #[test]
    fn lead_rooms_respect_alloted_areas() {
        let agent = claims("sales", &["goa"]);
        assert!(can_join(&agent, "goa|all"));
        assert!(can_join(&agent, "goa|interested"));
        assert!(!can_join(&agent, "delhi|all"));
        assert!(can_join(&claims("manager", &[]), "delhi|all"));
    }

    #[tokio::test]
    async fn releasing_a_room_prunes_it_from_the_hub() {
        let hub = RealtimeHub::new(std::time::Duration::from_secs(10), 100);
        let (tx, _rx) = mpsc::channel(4);

        let handle = forward_room(&hub, "conversation:abc", tx).await;
        assert_eq!(hub.subscriber_count("conversation:abc").await, 1);

        release_room(&hub, "conversation:abc", handle).await;
        assert_eq!(hub.room_count().await, 0);
    }

    #[test]
    fn mixed_case_lead_rooms_join_the_canonical_room() {
        let agent = claims("sales", &["goa"]);
        let room = hub::normalize_room("Goa|Hot");
        assert_eq!(room, hub::lead_room("goa", Some("hot")));
        assert!(can_join(&agent, &room));
    }

    #[test]
    fn whatsapp_rooms_are_open_and_unknown_rooms_are_not() {
        let agent = claims("agent", &[]);
        let conversation = hub::conversation_room(Uuid::new_v4());
        assert!(can_join(&agent, hub::INBOX_ROOM));
        assert!(can_join(&agent, &conversation));
        assert!(!can_join(&agent, "conversation:"));
        assert!(!can_join(&agent, "qualquer-coisa"));
    }
}
