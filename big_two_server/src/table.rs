use big_two_core::{Deck, DeckError, GameRound, MoveError, MoveOutcome, RoundSnapshot, Seat};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

/// 牌桌任务已经退出
#[derive(Debug, Error)]
#[error("牌桌已关闭")]
pub struct TableClosed;

/// 指令的执行结果，以及执行完那一刻发布的牌局。
/// 调用方据此生成快照，不会读到之后其他指令修改过的状态。
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub round: GameRound,
}

/// 发给牌桌任务的指令。
/// 同一张牌桌的所有修改都经过这个队列串行执行，任何时刻最多只有一个出牌在处理。
enum TableCommand {
    SetName { seat: Seat, name: String },
    Start { deck: Deck, reply: oneshot::Sender<Result<Applied<Seat>, DeckError>> },
    Move { seat: Seat, selection: Vec<usize>, reply: oneshot::Sender<Result<Applied<MoveOutcome>, MoveError>> },
    Abort,
}

/// 牌桌句柄。克隆后可以在多个连接任务之间共享。
#[derive(Clone)]
pub struct TableHandle {
    commands: mpsc::Sender<TableCommand>,
    // 每次修改完成后整体发布，读取方不会看到修改到一半的状态
    published: watch::Receiver<GameRound>,
}

impl TableHandle {
    /// 启动一个新的牌桌任务。所有句柄被丢弃后任务自动退出。
    pub fn spawn() -> TableHandle {
        let (tx, rx) = mpsc::channel(32);
        let (published_tx, published_rx) = watch::channel(GameRound::new());
        tokio::spawn(run_table(rx, published_tx));
        TableHandle { commands: tx, published: published_rx }
    }

    pub async fn set_name(&self, seat: Seat, name: String) -> Result<(), TableClosed> {
        self.commands.send(TableCommand::SetName { seat, name }).await.map_err(|_| TableClosed)
    }

    pub async fn start(&self, deck: Deck) -> Result<Result<Applied<Seat>, DeckError>, TableClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands.send(TableCommand::Start { deck, reply }).await.map_err(|_| TableClosed)?;
        rx.await.map_err(|_| TableClosed)
    }

    pub async fn play(
        &self,
        seat: Seat,
        selection: Vec<usize>,
    ) -> Result<Result<Applied<MoveOutcome>, MoveError>, TableClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(TableCommand::Move { seat, selection, reply })
            .await
            .map_err(|_| TableClosed)?;
        rx.await.map_err(|_| TableClosed)
    }

    pub async fn abort(&self) -> Result<(), TableClosed> {
        self.commands.send(TableCommand::Abort).await.map_err(|_| TableClosed)
    }

    /// 最近一次发布的状态，为 `viewer` 隐藏他人手牌
    pub fn snapshot(&self, viewer: Option<Seat>) -> RoundSnapshot {
        self.published.borrow().snapshot(viewer)
    }

    pub fn is_in_progress(&self) -> bool {
        self.published.borrow().is_in_progress()
    }

    pub fn is_round_over(&self) -> bool {
        self.published.borrow().is_round_over()
    }
}

/// 牌桌任务：独占持有 `GameRound`，按顺序处理指令。
/// 先发布新状态再回复调用方，调用方收到回复时快照一定已经更新。
async fn run_table(mut commands: mpsc::Receiver<TableCommand>, published: watch::Sender<GameRound>) {
    let mut round = GameRound::new();

    while let Some(command) = commands.recv().await {
        match command {
            TableCommand::SetName { seat, name } => {
                round.set_player_name(seat, name);
                published.send_replace(round.clone());
            }
            TableCommand::Start { deck, reply } => {
                let result = round.start(deck).map(|value| Applied { value, round: round.clone() });
                if let Err(e) = &result {
                    warn!("发牌失败: {}", e);
                }
                published.send_replace(round.clone());
                let _ = reply.send(result);
            }
            TableCommand::Move { seat, selection, reply } => {
                let result = match round.apply_move(seat, &selection) {
                    Ok(value) => {
                        published.send_replace(round.clone());
                        Ok(Applied { value, round: round.clone() })
                    }
                    // 被拒绝的出牌不改变状态，不需要重新发布
                    Err(e) => {
                        debug!(seat, "出牌被拒绝: {}", e);
                        Err(e)
                    }
                };
                let _ = reply.send(result);
            }
            TableCommand::Abort => {
                round.abort();
                published.send_replace(round.clone());
            }
        }
    }
    debug!("牌桌任务退出");
}

// --- 单元测试 ---
