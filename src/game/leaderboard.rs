//! Leaderboard state and the hub subscriber that maintains it

use tracing::{debug, info};

use crate::bus::{Hub, Member};
use crate::ws::protocol::{Message, Record, STANDING_CAPACITY};

/// Bounded top-score list, best first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    records: Vec<Record>,
    capacity: usize,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::with_capacity(STANDING_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Fold one finished run into the board. Equal scores keep arrival
    /// order, so a new record lands after existing ties. Returns whether the
    /// board changed.
    pub fn submit(&mut self, record: Record) -> bool {
        let mut candidate = Vec::with_capacity(self.records.len() + 1);
        candidate.extend_from_slice(&self.records);
        candidate.push(record);

        // stable
        candidate.sort_by(|a, b| b.score.cmp(&a.score));
        candidate.truncate(self.capacity);

        if candidate == self.records {
            return false;
        }
        self.records = candidate;
        true
    }

    /// React to a hub message, returning the standing to publish if any
    pub fn apply(&mut self, msg: &Message) -> Option<Message> {
        match msg {
            Message::Update(user) if !user.running && user.score > 0 => {
                let changed = self.submit(Record::new(user.name.clone(), user.score));
                changed.then(|| self.standing())
            }
            Message::Update(_) => None,
            Message::Join => Some(self.standing()),
            Message::Leave(_) | Message::Standing(_) => None,
        }
    }

    pub fn standing(&self) -> Message {
        Message::Standing(self.records.clone())
    }
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Single hub subscriber owning the relay's leaderboard
pub struct Maintainer {
    member: Member,
    board: Leaderboard,
}

impl Maintainer {
    pub fn new(hub: &Hub) -> Self {
        Self {
            member: hub.join(),
            board: Leaderboard::new(),
        }
    }

    /// Process hub messages one at a time until the hub closes
    pub async fn run(mut self) {
        info!("Leaderboard maintainer started");

        while let Some(msg) = self.member.next().await {
            if let Some(standing) = self.board.apply(&msg) {
                debug!(
                    trigger = msg.kind(),
                    entries = self.board.records().len(),
                    "Publishing standing"
                );
                self.member.publish(standing);
            }
        }

        info!("Leaderboard maintainer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{PlayerId, User};
    use std::time::Duration;
    use tokio::time::timeout;

    fn finished(name: &str, score: i32) -> Message {
        Message::Update(User {
            id: PlayerId::from(name),
            name: name.to_string(),
            running: false,
            score,
            ..Default::default()
        })
    }

    fn records(entries: &[(&str, i32)]) -> Vec<Record> {
        entries.iter().map(|(n, s)| Record::new(*n, *s)).collect()
    }

    #[test]
    fn ties_keep_arrival_order() {
        let mut board = Leaderboard::new();

        assert_eq!(
            board.apply(&finished("Alice", 10)),
            Some(Message::Standing(records(&[("Alice", 10)])))
        );
        assert_eq!(
            board.apply(&finished("Bob", 30)),
            Some(Message::Standing(records(&[("Bob", 30), ("Alice", 10)])))
        );
        assert_eq!(
            board.apply(&finished("Carol", 10)),
            Some(Message::Standing(records(&[
                ("Bob", 30),
                ("Alice", 10),
                ("Carol", 10)
            ])))
        );
    }

    #[test]
    fn board_is_bounded_and_sorted() {
        let mut board = Leaderboard::new();
        for (i, score) in [4, 9, 1, 7, 7, 3, 12, 5].into_iter().enumerate() {
            board.submit(Record::new(format!("p{i}"), score));
            assert!(board.records().len() <= STANDING_CAPACITY);
            assert!(board
                .records()
                .windows(2)
                .all(|w| w[0].score >= w[1].score));
        }

        assert_eq!(
            board.records(),
            records(&[("p6", 12), ("p1", 9), ("p3", 7), ("p4", 7), ("p7", 5)]).as_slice()
        );
    }

    #[test]
    fn score_below_a_full_board_publishes_nothing() {
        let mut board = Leaderboard::new();
        for score in [50, 40, 30, 20, 10] {
            board.submit(Record::new("x", score));
        }
        let before = board.clone();

        assert_eq!(board.apply(&finished("late", 5)), None);
        assert_eq!(board.apply(&finished("late", 5)), None);
        // ties with the last place sort after it and fall off
        assert_eq!(board.apply(&finished("tie", 10)), None);
        assert_eq!(board, before);
    }

    #[test]
    fn running_or_scoreless_updates_are_ignored() {
        let mut board = Leaderboard::new();
        let running = Message::Update(User {
            name: "r".into(),
            running: true,
            score: 8,
            ..Default::default()
        });

        assert_eq!(board.apply(&running), None);
        assert_eq!(board.apply(&finished("zero", 0)), None);
        assert!(board.records().is_empty());
    }

    #[test]
    fn join_always_republishes_current_board() {
        let mut board = Leaderboard::new();
        assert_eq!(board.apply(&Message::Join), Some(Message::Standing(Vec::new())));

        board.apply(&finished("a", 3));
        assert_eq!(
            board.apply(&Message::Join),
            Some(Message::Standing(records(&[("a", 3)])))
        );
    }

    #[test]
    fn leave_and_standing_are_ignored() {
        let mut board = Leaderboard::new();
        assert_eq!(board.apply(&Message::Leave(PlayerId::from("a"))), None);
        assert_eq!(
            board.apply(&Message::Standing(records(&[("forged", 999)]))),
            None
        );
        assert!(board.records().is_empty());
    }

    async fn next_msg(member: &mut Member) -> Message {
        let delivery = timeout(Duration::from_secs(1), member.next())
            .await
            .expect("timed out waiting for hub message")
            .expect("hub closed");
        (*delivery).clone()
    }

    #[tokio::test]
    async fn maintainer_answers_join_and_scores_over_the_hub() {
        let hub = Hub::new();
        let handle = tokio::spawn(Maintainer::new(&hub).run());
        let mut client = hub.join();

        client.publish(Message::Join);
        assert_eq!(next_msg(&mut client).await, Message::Join);
        assert_eq!(next_msg(&mut client).await, Message::Standing(Vec::new()));

        client.publish(finished("Alice", 10));
        assert_eq!(next_msg(&mut client).await, finished("Alice", 10));
        assert_eq!(
            next_msg(&mut client).await,
            Message::Standing(records(&[("Alice", 10)]))
        );

        hub.close();
        timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
