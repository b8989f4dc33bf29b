use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{GameStateEntity, PlayerEntity, RoomEntity, TeamEntity},
    dao::room_store::{ChangeEvent, RoomStore, StoreTable},
    error::ServiceError,
    sync::SyncBridge,
};

/// A team together with its current roster.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRoster {
    /// The team row.
    pub team: TeamEntity,
    /// Players assigned to it, in join order.
    pub players: Vec<PlayerEntity>,
}

/// The cached view of one room, rebuilt from the store on every signal.
///
/// This is a disposable projection: any instance can be thrown away and
/// reloaded from the store without losing anything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomSnapshot {
    /// The room row, absent until the first load completes.
    pub room: Option<RoomEntity>,
    /// Full roster in join order, host included.
    pub players: Vec<PlayerEntity>,
    /// Teams with their rosters, in creation order.
    pub teams: Vec<TeamRoster>,
    /// The game-state singleton, absent before the first game start.
    pub game_state: Option<GameStateEntity>,
    /// Scores keyed by display name (custom name falling back to "Team N").
    pub scores: IndexMap<String, i32>,
}

/// Which collection a change signal invalidates.
enum Invalidated {
    Room,
    Players,
    Teams,
    GameState,
    Closed,
}

/// Maintains a [`RoomSnapshot`] for one room by re-fetching collections as
/// change signals arrive, and republishes it through a watch channel.
///
/// One watcher corresponds to one connected client's view of the room.
pub struct RoomWatcher {
    bridge: Arc<SyncBridge>,
    snapshot_rx: watch::Receiver<RoomSnapshot>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RoomWatcher {
    /// Connect to the room's change feed, load the initial snapshot, and
    /// start watching.
    pub async fn start(store: Arc<dyn RoomStore>, code: &str) -> Result<Self, ServiceError> {
        let bridge = Arc::new(SyncBridge::connect(store.clone(), code).await?);
        let room_id = bridge.room_id();

        // Register table interest before any refetch so no signal emitted
        // during the initial load is missed.
        let rooms = bridge.on_change(StoreTable::Rooms);
        let players = bridge.on_change(StoreTable::Players);
        let teams = bridge.on_change(StoreTable::Teams);
        let game_state = bridge.on_change(StoreTable::GameState);
        // Quiz answers feed the score display, which lives on team rows.
        let quiz_answers = bridge.on_change(StoreTable::PopQuizAnswers);

        let initial = load_snapshot(&store, room_id).await?;
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let task = tokio::spawn(run_watch(
            store,
            room_id,
            snapshot_tx,
            WatchedTables {
                rooms,
                players,
                teams,
                game_state,
                quiz_answers,
            },
        ));

        Ok(Self {
            bridge,
            snapshot_rx,
            task: Mutex::new(Some(task)),
        })
    }

    /// The room being watched.
    pub fn room_id(&self) -> Uuid {
        self.bridge.room_id()
    }

    /// Clone of the latest snapshot.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that yields whenever the snapshot is rebuilt.
    pub fn subscribe(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Stop watching and disconnect the underlying bridge. Idempotent.
    pub fn stop(&self) {
        if let Ok(mut guard) = self.task.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
        self.bridge.disconnect();
    }
}

impl Drop for RoomWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WatchedTables {
    rooms: broadcast::Receiver<ChangeEvent>,
    players: broadcast::Receiver<ChangeEvent>,
    teams: broadcast::Receiver<ChangeEvent>,
    game_state: broadcast::Receiver<ChangeEvent>,
    quiz_answers: broadcast::Receiver<ChangeEvent>,
}

/// Consume signals until every channel closes, re-fetching the invalidated
/// collection on each one. A lagged receiver is treated as a signal: the
/// refetch pulls current state, so skipped events cost nothing.
async fn run_watch(
    store: Arc<dyn RoomStore>,
    room_id: Uuid,
    snapshot_tx: watch::Sender<RoomSnapshot>,
    mut tables: WatchedTables,
) {
    loop {
        let invalidated = tokio::select! {
            result = tables.rooms.recv() => as_signal(result, Invalidated::Room),
            result = tables.players.recv() => as_signal(result, Invalidated::Players),
            result = tables.teams.recv() => as_signal(result, Invalidated::Teams),
            result = tables.game_state.recv() => as_signal(result, Invalidated::GameState),
            result = tables.quiz_answers.recv() => as_signal(result, Invalidated::Teams),
        };

        match invalidated {
            Invalidated::Closed => break,
            Invalidated::Room => match store.find_room(room_id).await {
                Ok(room) => snapshot_tx.send_modify(|snapshot| snapshot.room = room),
                Err(err) => warn!(error = %err, "room refetch failed; keeping stale cache"),
            },
            Invalidated::Players => match store.list_players(room_id).await {
                Ok(players) => snapshot_tx.send_modify(|snapshot| {
                    snapshot.players = players;
                    rebuild_rosters(snapshot);
                }),
                Err(err) => warn!(error = %err, "player refetch failed; keeping stale cache"),
            },
            Invalidated::Teams => match store.list_teams(room_id).await {
                Ok(teams) => snapshot_tx.send_modify(|snapshot| {
                    apply_teams(snapshot, teams);
                }),
                Err(err) => warn!(error = %err, "team refetch failed; keeping stale cache"),
            },
            Invalidated::GameState => match store.find_game_state(room_id).await {
                Ok(state) => snapshot_tx.send_modify(|snapshot| snapshot.game_state = state),
                Err(err) => warn!(error = %err, "game state refetch failed; keeping stale cache"),
            },
        }
    }
}

fn as_signal(result: Result<ChangeEvent, RecvError>, invalidated: Invalidated) -> Invalidated {
    match result {
        Ok(_) | Err(RecvError::Lagged(_)) => invalidated,
        Err(RecvError::Closed) => Invalidated::Closed,
    }
}

/// One-shot load of every collection, used before the watch loop starts.
async fn load_snapshot(
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
) -> Result<RoomSnapshot, ServiceError> {
    let mut snapshot = RoomSnapshot {
        room: store.find_room(room_id).await?,
        players: store.list_players(room_id).await?,
        game_state: store.find_game_state(room_id).await?,
        ..RoomSnapshot::default()
    };
    apply_teams(&mut snapshot, store.list_teams(room_id).await?);
    Ok(snapshot)
}

fn apply_teams(snapshot: &mut RoomSnapshot, teams: Vec<TeamEntity>) {
    snapshot.teams = teams
        .into_iter()
        .map(|team| TeamRoster {
            team,
            players: Vec::new(),
        })
        .collect();
    rebuild_rosters(snapshot);
}

fn rebuild_rosters(snapshot: &mut RoomSnapshot) {
    let players = snapshot.players.clone();
    let mut scores = IndexMap::new();
    for roster in &mut snapshot.teams {
        roster.players = players
            .iter()
            .filter(|player| player.team_id == Some(roster.team.id))
            .cloned()
            .collect();
        scores.insert(roster.team.display_name().to_string(), roster.team.score);
    }
    snapshot.scores = scores;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::room_store::memory::MemoryRoomStore;
    use crate::dao::room_store::{NewPlayer, NewRoom, NewTeam};
    use std::time::Duration;

    async fn seeded_store(code: &str) -> (Arc<dyn RoomStore>, Uuid) {
        let store = MemoryRoomStore::new();
        let room = store
            .insert_room(NewRoom {
                code: code.into(),
                host_id: Uuid::new_v4(),
                game_mode: None,
                topic: None,
                content_pack: None,
                team_size: 4,
                target_score: 5,
            })
            .await
            .unwrap();
        (Arc::new(store), room.id)
    }

    /// Poll until `predicate` holds or the deadline passes.
    async fn eventually<F>(mut predicate: F)
    where
        F: FnMut() -> bool,
    {
        for _ in 0..200 {
            if predicate() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn initial_snapshot_contains_the_room() {
        let (store, room_id) = seeded_store("WATCH1").await;
        let watcher = RoomWatcher::start(store, "WATCH1").await.unwrap();
        let snapshot = watcher.snapshot();
        assert_eq!(snapshot.room.as_ref().map(|room| room.id), Some(room_id));
    }

    #[tokio::test]
    async fn player_joins_appear_via_refetch() {
        let (store, room_id) = seeded_store("WATCH2").await;
        let watcher = RoomWatcher::start(store.clone(), "WATCH2").await.unwrap();

        for name in ["a", "b", "c"] {
            store
                .insert_player(NewPlayer {
                    id: Uuid::new_v4(),
                    room_id,
                    username: name.into(),
                    is_host: false,
                })
                .await
                .unwrap();
        }

        eventually(|| watcher.snapshot().players.len() == 3).await;
        let names: Vec<String> = watcher
            .snapshot()
            .players
            .iter()
            .map(|player| player.username.clone())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn scores_key_by_display_name() {
        let (store, room_id) = seeded_store("WATCH3").await;
        let watcher = RoomWatcher::start(store.clone(), "WATCH3").await.unwrap();

        let team = store
            .insert_team(NewTeam {
                room_id,
                original_name: "Team 1".into(),
                custom_name: Some("The Quizzards".into()),
                color: "bg-blue-500".into(),
            })
            .await
            .unwrap();
        store.increment_team_score(team.id, 2).await.unwrap();

        eventually(|| watcher.snapshot().scores.get("The Quizzards") == Some(&2)).await;
    }

    #[tokio::test]
    async fn concurrent_writers_converge_to_identical_snapshots() {
        let (store, room_id) = seeded_store("WATCH4").await;
        let first = RoomWatcher::start(store.clone(), "WATCH4").await.unwrap();
        let second = RoomWatcher::start(store.clone(), "WATCH4").await.unwrap();

        let team = store
            .insert_team(NewTeam {
                room_id,
                original_name: "Team 1".into(),
                custom_name: None,
                color: "bg-blue-500".into(),
            })
            .await
            .unwrap();

        // Several simulated clients writing at once, with no coordination.
        let mut writers = Vec::new();
        for client in 0..4 {
            let store = store.clone();
            writers.push(tokio::spawn(async move {
                for i in 0..5 {
                    store
                        .insert_player(NewPlayer {
                            id: Uuid::new_v4(),
                            room_id,
                            username: format!("client{client}-p{i}"),
                            is_host: false,
                        })
                        .await
                        .unwrap();
                    store.increment_team_score(team.id, 1).await.unwrap();
                }
            }));
        }
        for writer in writers {
            writer.await.unwrap();
        }

        let authoritative = store.list_players(room_id).await.unwrap();
        assert_eq!(authoritative.len(), 20);

        eventually(|| {
            let a = first.snapshot();
            let b = second.snapshot();
            a.players.len() == 20
                && a == b
                && a.scores.get("Team 1") == Some(&20)
        })
        .await;
    }
}
