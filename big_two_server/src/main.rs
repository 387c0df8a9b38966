mod table;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use dashmap::DashMap;
use futures_util::{stream::StreamExt, SinkExt};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use big_two_core::{ClientMessage, Deck, MoveOutcome, RoomId, Seat, ServerMessage, NUM_PLAYERS};
use table::TableHandle;

/// 大老二服务器
#[derive(Parser, Debug)]
#[command(name = "big_two_server", version, about = "大老二对局服务器", long_about = None)]
struct ServerArgs {
    /// 监听地址
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,

    /// 监听端口
    #[arg(short, long, default_value_t = 25917)]
    port: u16,
}

// 服务器全局状态
struct AppState {
    rooms: DashMap<RoomId, Arc<Room>>,
}

// 单个房间的状态
// 牌局本身由牌桌任务独占，房间只负责座位和连接。
struct Room {
    table: TableHandle,
    // 下标即座位号
    seats: RwLock<[Option<SeatConnection>; NUM_PLAYERS]>,
}

// 座位上玩家的网络连接信息
struct SeatConnection {
    nickname: String,
    ready: bool,
    // 用于向该玩家的 WebSocket 任务发送消息的通道
    sender: mpsc::Sender<ServerMessage>,
}

type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = ServerArgs::parse();

    let state = SharedState::new(AppState {
        rooms: DashMap::new(),
    });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state);

    let addr = SocketAddr::new(args.host, args.port);
    info!("服务器正在监听 {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，用于从其他任务接收要发送的消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    // 当前连接的上下文信息，加入房间后填充
    let mut seat_context: Option<(RoomId, Seat)> = None;

    // 主循环，处理从客户端接收到的消息
    // 同一个连接的消息按到达顺序逐条处理
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, state.clone(), &tx, &mut seat_context).await;
                }
                Err(e) => {
                    warn!("解析消息失败: {}", e);
                }
            }
        }
    }

    // 客户端断开连接，执行清理工作
    if let Some((room_id, seat)) = seat_context {
        handle_disconnect(state, room_id, seat).await;
    }
    info!("客户端连接关闭");
}

/// 核心消息处理逻辑
async fn handle_client_message(
    msg: ClientMessage,
    state: SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<(RoomId, Seat)>,
) {
    match msg {
        ClientMessage::CreateRoom { nickname } => {
            if context.is_some() {
                let _ = tx.send(ServerMessage::Error { message: "你已经在一个房间里了".to_string() }).await;
                return;
            }

            let room_id = Uuid::new_v4();
            let room = Arc::new(Room {
                table: TableHandle::spawn(),
                seats: RwLock::new(Default::default()),
            });
            state.rooms.insert(room_id, room.clone());
            info!("创建了新房间 {}", room_id);

            join_room(room_id, room, nickname, tx, context).await;
        }
        ClientMessage::JoinRoom { room_id, nickname } => {
            if context.is_some() {
                let _ = tx.send(ServerMessage::Error { message: "你已经在一个房间里了".to_string() }).await;
                return;
            }

            let room = match state.rooms.get(&room_id).map(|r| r.clone()) {
                Some(r) => r,
                None => {
                    let _ = tx.send(ServerMessage::Error { message: "房间不存在".to_string() }).await;
                    return;
                }
            };

            join_room(room_id, room, nickname, tx, context).await;
        }
        // ... 其他需要先加入房间才能执行的消息
        _ => {
            let Some((room_id, seat)) = *context else {
                let _ = tx.send(ServerMessage::Error { message: "请先加入或创建房间".to_string() }).await;
                return;
            };
            let room = match state.rooms.get(&room_id).map(|r| r.clone()) {
                None => {
                    let _ = tx.send(ServerMessage::Error { message: "房间不存在".to_string() }).await;
                    return;
                }
                Some(r) => r,
            };

            match msg {
                ClientMessage::Ready => handle_ready(&room, seat).await,
                ClientMessage::PlayMove { cards } => handle_move(&room, seat, cards, tx).await,
                ClientMessage::GetSnapshot => {
                    let _ = tx.send(ServerMessage::Snapshot(room.table.snapshot(Some(seat)))).await;
                }
                ClientMessage::CreateRoom { .. } | ClientMessage::JoinRoom { .. } => {}
            }
        }
    }
}

/// 在房间里找一个空座位坐下
async fn join_room(
    room_id: RoomId,
    room: Arc<Room>,
    nickname: String,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<(RoomId, Seat)>,
) {
    let seat = {
        let mut seats = room.seats.write().await;
        let Some(seat) = seats.iter().position(Option::is_none) else {
            let _ = tx.send(ServerMessage::Error { message: "房间已满".to_string() }).await;
            return;
        };
        seats[seat] = Some(SeatConnection {
            nickname: nickname.clone(),
            ready: false,
            sender: tx.clone(),
        });
        seat
    };

    if room.table.set_name(seat, nickname.clone()).await.is_err() {
        warn!("房间 {} 的牌桌已关闭", room_id);
    }

    info!("玩家 {} 坐在房间 {} 的 {} 号座位", nickname, room_id, seat);
    *context = Some((room_id, seat));

    // 广播给房间内其他玩家
    let join_msg = ServerMessage::PlayerJoined { seat, nickname };
    broadcast(&*room.seats.read().await, &join_msg, Some(seat)).await;

    let _ = tx.send(ServerMessage::RoomJoined {
        room_id,
        your_seat: seat,
        snapshot: room.table.snapshot(Some(seat)),
    }).await;
}

/// 准备请求的处理结果
#[derive(Debug, PartialEq, Eq)]
enum ReadyCheck {
    /// 牌局进行中，准备不被记录
    RoundInProgress,
    Waiting,
    AllReady,
}

/// 记录某个座位已准备。只有没有进行中的牌局时才接受，
/// 这样每局结束后四个座位都必须重新准备。
fn mark_ready(seats: &mut [Option<SeatConnection>], seat: Seat, in_progress: bool) -> ReadyCheck {
    if in_progress {
        return ReadyCheck::RoundInProgress;
    }
    if let Some(conn) = seats.get_mut(seat).and_then(Option::as_mut) {
        conn.ready = true;
    }
    if seats.iter().all(|s| s.as_ref().is_some_and(|c| c.ready)) {
        ReadyCheck::AllReady
    } else {
        ReadyCheck::Waiting
    }
}

fn clear_ready(seats: &mut [Option<SeatConnection>]) {
    for conn in seats.iter_mut().flatten() {
        conn.ready = false;
    }
}

/// 玩家准备。四个座位都坐满且都准备好后洗牌开局。
async fn handle_ready(room: &Room, seat: Seat) {
    let mut seats = room.seats.write().await;
    match mark_ready(&mut *seats, seat, room.table.is_in_progress()) {
        ReadyCheck::RoundInProgress => {
            if let Some(conn) = &seats[seat] {
                send_to(conn, ServerMessage::Error { message: "牌局进行中，本局结束后再准备".to_string() }).await;
            }
            return;
        }
        ReadyCheck::Waiting => {
            broadcast(&*seats, &ServerMessage::PlayerReady { seat }, None).await;
            return;
        }
        ReadyCheck::AllReady => {
            broadcast(&*seats, &ServerMessage::PlayerReady { seat }, None).await;
        }
    }

    // 洗牌由服务器负责，引擎只按给定顺序发牌
    let mut deck = Deck::standard();
    deck.shuffle(&mut rand::rng());

    let started = match room.table.start(deck).await {
        Ok(Ok(started)) => started,
        Ok(Err(e)) => {
            warn!("开局失败: {}", e);
            return;
        }
        Err(e) => {
            warn!("开局失败: {}", e);
            return;
        }
    };
    let first_player = started.value;
    info!("新的一局开始，{} 号座位先出", first_player);

    clear_ready(&mut *seats);
    for (i, slot) in seats.iter().enumerate() {
        let Some(conn) = slot else { continue };
        let snapshot = started.round.snapshot(Some(i));
        let your_hand = snapshot.hand_of(i).map(|hand| hand.to_vec()).unwrap_or_default();
        send_to(conn, ServerMessage::RoundStarted { first_player, your_hand }).await;
        send_to(conn, ServerMessage::Snapshot(snapshot)).await;
    }
}

/// 把出牌交给牌桌任务。被拒绝时只通知出牌者，接受后广播给整个房间。
async fn handle_move(room: &Room, seat: Seat, cards: Vec<usize>, tx: &mpsc::Sender<ServerMessage>) {
    let applied = match room.table.play(seat, cards).await {
        Ok(Ok(applied)) => applied,
        Ok(Err(error)) => {
            let _ = tx.send(ServerMessage::MoveRejected { error }).await;
            return;
        }
        Err(e) => {
            let _ = tx.send(ServerMessage::Error { message: e.to_string() }).await;
            return;
        }
    };

    let seats = room.seats.read().await;
    let results = match &applied.value {
        MoveOutcome::RoundEnded { results, .. } => Some(results.clone()),
        MoveOutcome::Passed { .. } | MoveOutcome::Played { .. } => None,
    };
    broadcast(&*seats, &ServerMessage::MoveMade { player: seat, outcome: applied.value }, None).await;

    // 快照需要为每个玩家单独生成，并且和这一步出牌对应
    for (i, slot) in seats.iter().enumerate() {
        if let Some(conn) = slot {
            send_to(conn, ServerMessage::Snapshot(applied.round.snapshot(Some(i)))).await;
        }
    }

    if let Some(results) = results {
        if let Some(winner) = results.winner() {
            info!("本局结束，{} 获胜", winner.name);
        }
        broadcast(&*seats, &ServerMessage::RoundOver { results }, None).await;
    }
}

/// 玩家断开连接后的处理
async fn handle_disconnect(state: SharedState, room_id: RoomId, seat: Seat) {
    info!("{} 号座位从房间 {} 断开连接", seat, room_id);
    let Some(room) = state.rooms.get(&room_id).map(|r| r.clone()) else { return };

    let mut seats = room.seats.write().await;
    let Some(conn) = seats[seat].take() else { return };

    // 有人离开时正在进行的牌局无法继续，直接中止
    if room.table.is_in_progress() {
        warn!("房间 {} 有玩家断开，中止当前牌局", room_id);
        if room.table.abort().await.is_err() {
            warn!("房间 {} 的牌桌已关闭", room_id);
        }
        broadcast(&*seats, &ServerMessage::Info { message: format!("{} 离开了，本局中止", conn.nickname) }, None).await;
    }
    clear_ready(&mut *seats);
    broadcast(&*seats, &ServerMessage::PlayerLeft { seat, nickname: conn.nickname }, None).await;

    // 判断是否清空房间
    if seats.iter().all(Option::is_none) {
        state.rooms.remove(&room_id);
        info!("房间 {} 已空，已被移除", room_id);
    }
}

async fn send_to(conn: &SeatConnection, message: ServerMessage) {
    if conn.sender.send(message).await.is_err() {
        // 发送失败，说明该玩家也断开了，后续由其自己的 handle_socket 任务处理
        warn!("向玩家 {} 发送消息失败（可能已断开）", conn.nickname);
    }
}

/// 向房间内所有玩家广播消息
async fn broadcast(
    seats: &[Option<SeatConnection>],
    message: &ServerMessage,
    exclude: Option<Seat>,
) {
    for (seat, slot) in seats.iter().enumerate() {
        if Some(seat) == exclude {
            continue;
        }
        if let Some(conn) = slot {
            send_to(conn, message.clone()).await;
        }
    }
}

// --- 单元测试 ---
