use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use big_two_core::{ClientMessage, MoveOutcome, RoomId, RoundSnapshot, ServerMessage, TableEntry};

/// 大老二命令行客户端
#[derive(Parser, Debug)]
#[command(name = "big_two_client", version, about = "大老二命令行客户端", long_about = None)]
struct ClientArgs {
    /// 服务器 WebSocket 地址
    #[arg(long, default_value = "ws://127.0.0.1:25917/ws")]
    url: Url,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ClientArgs::parse();

    println!("正在连接到: {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(server_msg) => {
                            print_server_message(&server_msg);
                            print!("> "); // 重新显示输入提示符
                            let _ = std::io::stdout().flush();
                        }
                        Err(e) => eprintln!("解析服务器消息失败: {}", e),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 大老二客户端 ---");
    println!("可用命令:");
    println!("  create <昵称>             - 创建一个新房间");
    println!("  join <房间ID> <昵称>      - 加入一个房间");
    println!("  ready                     - 准备开始下一局");
    println!("  play <下标> [下标...]     - 按手牌下标出牌");
    println!("  pass                      - 过牌");
    println!("  state                     - 查看当前牌局");
    println!("  exit                      - 退出");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else { break };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts.first().copied();

        let client_msg = match command {
            Some("create") => {
                let nickname = parts.get(1).unwrap_or(&"新玩家").to_string();
                ClientMessage::CreateRoom { nickname }
            }
            Some("join") => {
                if parts.len() < 3 {
                    println!("用法: join <房间ID> <昵称>");
                    continue;
                }
                let room_id: RoomId = match parts[1].parse() {
                    Ok(id) => id,
                    Err(_) => {
                        println!("无效的房间ID格式");
                        continue;
                    }
                };
                let nickname = parts[2].to_string();
                ClientMessage::JoinRoom { room_id, nickname }
            }
            Some("ready") => ClientMessage::Ready,
            Some("pass") => ClientMessage::pass(),
            Some("state") => ClientMessage::GetSnapshot,
            Some("play") => {
                let indices: Result<Vec<usize>, _> = parts[1..].iter().map(|p| p.parse::<usize>()).collect();
                match indices {
                    Ok(cards) if !cards.is_empty() => ClientMessage::play(cards),
                    _ => {
                        println!("用法: play <下标> [下标...]");
                        continue;
                    }
                }
            }
            Some("exit") => {
                println!("正在断开连接...");
                break;
            }
            None => continue,
            Some(_) => {
                println!("未知命令: {}", line);
                continue;
            }
        };

        let payload = serde_json::to_string(&client_msg)?;
        write.send(Message::Text(payload.into())).await?;
    }

    Ok(())
}

/// 把服务器事件打印到终端
fn print_server_message(msg: &ServerMessage) {
    match msg {
        ServerMessage::RoomJoined { room_id, your_seat, snapshot } => {
            println!("\n<-- 已进入房间 {}，你的座位是 {}", room_id, your_seat);
            print_snapshot(snapshot);
        }
        ServerMessage::PlayerJoined { seat, nickname } => println!("\n<-- {} 坐在了 {} 号座位", nickname, seat),
        ServerMessage::PlayerLeft { seat, nickname } => println!("\n<-- {} 离开了 {} 号座位", nickname, seat),
        ServerMessage::PlayerReady { seat } => println!("\n<-- {} 号座位已准备", seat),
        ServerMessage::RoundStarted { first_player, your_hand } => {
            println!("\n<-- 新的一局开始，{} 号座位先出", first_player);
            println!("你的手牌: {}", format_cards(your_hand));
        }
        ServerMessage::MoveMade { player, outcome } => match outcome {
            MoveOutcome::Passed { .. } => println!("\n<-- {} 号座位: {{过牌}}", player),
            MoveOutcome::Played { hand, .. } | MoveOutcome::RoundEnded { hand, .. } => {
                println!("\n<-- {} 号座位: {}", player, hand)
            }
        },
        ServerMessage::MoveRejected { error } => println!("\n<-- 出牌无效: {}", error),
        ServerMessage::Snapshot(snapshot) => print_snapshot(snapshot),
        ServerMessage::RoundOver { results } => {
            println!("\n<-- 本局结束");
            for standing in &results.standings {
                if standing.cards_left == 0 {
                    println!("{} 获胜", standing.name);
                } else {
                    println!("{} 还剩 {} 张牌", standing.name, standing.cards_left);
                }
            }
            println!("输入 ready 开始下一局");
        }
        ServerMessage::Info { message } => println!("\n<-- {}", message),
        ServerMessage::Error { message } => println!("\n<-- 错误: {}", message),
    }
}

fn print_snapshot(snapshot: &RoundSnapshot) {
    println!("--- 牌局 ({:?}) ---", snapshot.phase);
    for player in &snapshot.players {
        let marker = if snapshot.current_player == Some(player.id) { "*" } else { " " };
        println!("{} [{}] {} - {} 张", marker, player.id, player.name, player.card_count);
        if let Some(hand) = &player.hand {
            let indexed: Vec<String> = hand.iter().enumerate().map(|(i, c)| format!("{}:{}", i, c)).collect();
            println!("      {}", indexed.join(" "));
        }
    }
    match snapshot.table.last() {
        Some(TableEntry::Pass { player }) => println!("上一手: {} 号座位过牌", player),
        Some(TableEntry::Play(_)) | None => {}
    }
    if let Some(hand) = snapshot.last_play() {
        println!("桌面: {} 号座位 {}", hand.owner(), hand);
    }
}

fn format_cards(cards: &[big_two_core::Card]) -> String {
    cards.iter().map(|c| format!("[{}]", c)).collect::<Vec<_>>().join(" ")
}
