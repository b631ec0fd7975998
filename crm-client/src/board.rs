//! Optimistic deal board.
//!
//! A drop is applied to the in-memory board right away so the view can render it, then
//! persisted with a single move request. If the server refuses, the board goes back to
//! its pre-drag state and an error notification is queued for the view.

use shared_types::{DealWithDetails, DragResult, MoveDealRequest, PipelineBoard};

use crate::api::{ApiClient, ClientError, DealMover};

pub const MOVE_FAILED: &str = "Failed to move deal";

/// An error toast for the view to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub detail: Option<String>,
}

impl Notification {
    pub fn error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Dropped outside a column, onto its own slot, or for a card the board does not hold.
    Ignored,
    Persisted(MoveDealRequest),
    RolledBack,
}

/// A drop already shown on the board and waiting for the server.
#[derive(Debug)]
pub struct PendingMove {
    pub request: MoveDealRequest,
    snapshot: PipelineBoard,
}

#[derive(Debug, Default)]
pub struct OptimisticBoard {
    board: PipelineBoard,
    notifications: Vec<Notification>,
}

impl OptimisticBoard {
    pub fn new(board: PipelineBoard) -> Self {
        Self {
            board,
            notifications: Vec::new(),
        }
    }

    pub async fn load(client: &ApiClient) -> Result<Self, ClientError> {
        Ok(Self::new(client.get_board().await?))
    }

    pub fn board(&self) -> &PipelineBoard {
        &self.board
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Hands queued notifications to the view and clears them.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Applies the drop locally. `None` means there is nothing to persist.
    pub fn begin_move(&mut self, drag: &DragResult) -> Option<PendingMove> {
        let snapshot = self.board.clone();
        match self.board.apply_drag(drag) {
            Ok(Some(request)) => Some(PendingMove { request, snapshot }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Ignoring drop of deal {}: {}", drag.deal_id, e);
                None
            }
        }
    }

    /// Reconciles a pending move with the server's answer.
    pub fn settle(
        &mut self,
        pending: PendingMove,
        result: Result<DealWithDetails, ClientError>,
    ) -> DragOutcome {
        match result {
            Ok(saved) => {
                self.replace_card(saved);
                DragOutcome::Persisted(pending.request)
            }
            Err(e) => {
                tracing::error!("Failed to move deal {}: {}", pending.request.deal_id, e);
                self.board = pending.snapshot;
                self.notifications
                    .push(Notification::error(MOVE_FAILED, e.to_string()));
                DragOutcome::RolledBack
            }
        }
    }

    pub async fn on_drag_end<M>(&mut self, mover: &M, drag: &DragResult) -> DragOutcome
    where
        M: DealMover + ?Sized,
    {
        let Some(pending) = self.begin_move(drag) else {
            return DragOutcome::Ignored;
        };
        let result = mover.move_deal(&pending.request).await;
        self.settle(pending, result)
    }

    /// Swaps in the server's copy of a card, keeping the card where the board put it.
    fn replace_card(&mut self, saved: DealWithDetails) {
        let card = self
            .board
            .columns
            .iter_mut()
            .flat_map(|column| column.deals.iter_mut())
            .find(|card| card.deal.id == saved.deal.id);

        if let Some(card) = card {
            let position = card.deal.position;
            *card = saved;
            card.deal.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared_types::{Deal, DealStage, DragLocation};
    use std::sync::Mutex;

    fn stage(id: &str, order: i64) -> DealStage {
        DealStage {
            id: id.to_string(),
            user_id: "user".to_string(),
            name: id.to_uppercase(),
            color: None,
            display_order: order,
            is_won: false,
            is_lost: false,
            created_at: 0,
        }
    }

    fn card(id: &str, stage: &DealStage, position: i64) -> DealWithDetails {
        DealWithDetails {
            deal: Deal {
                id: id.to_string(),
                user_id: "user".to_string(),
                title: format!("Deal {}", id),
                value: Some(100.0),
                currency: "USD".to_string(),
                probability: None,
                stage_id: stage.id.clone(),
                company_id: None,
                expected_close_date: None,
                description: None,
                position,
                won_at: None,
                lost_at: None,
                lost_reason: None,
                created_at: 0,
                updated_at: 0,
            },
            stage: stage.clone(),
            company: None,
        }
    }

    fn board() -> PipelineBoard {
        let lead = stage("lead", 0);
        let won = stage("won", 1);
        PipelineBoard::from_parts(
            vec![lead.clone(), won.clone()],
            vec![card("d1", &lead, 0), card("d2", &lead, 1), card("d3", &won, 0)],
        )
    }

    fn drag(deal_id: &str, from: (&str, usize), to: Option<(&str, usize)>) -> DragResult {
        DragResult {
            deal_id: deal_id.to_string(),
            source: DragLocation {
                stage_id: from.0.to_string(),
                index: from.1,
            },
            destination: to.map(|(stage_id, index)| DragLocation {
                stage_id: stage_id.to_string(),
                index,
            }),
        }
    }

    /// Records requests and either echoes the moved card or fails.
    struct FakeMover {
        fail: bool,
        calls: Mutex<Vec<MoveDealRequest>>,
    }

    impl FakeMover {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DealMover for FakeMover {
        async fn move_deal(&self, request: &MoveDealRequest) -> Result<DealWithDetails, ClientError> {
            self.calls.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ClientError::NotFound);
            }
            let target = stage(&request.stage_id, 1);
            let mut saved = card(&request.deal_id, &target, request.position);
            saved.deal.won_at = Some(1_700_000_000);
            Ok(saved)
        }
    }

    #[tokio::test]
    async fn test_successful_drop_is_kept() {
        let mover = FakeMover::new(false);
        let mut board = OptimisticBoard::new(board());

        let outcome = board
            .on_drag_end(&mover, &drag("d1", ("lead", 0), Some(("won", 0))))
            .await;

        assert_eq!(
            outcome,
            DragOutcome::Persisted(MoveDealRequest {
                deal_id: "d1".to_string(),
                stage_id: "won".to_string(),
                position: 0,
            })
        );
        assert_eq!(board.board().deal_ids("lead"), vec!["d2"]);
        assert_eq!(board.board().deal_ids("won"), vec!["d1", "d3"]);
        assert!(board.notifications().is_empty());

        let moved = &board.board().column("won").unwrap().deals[0];
        assert_eq!(moved.deal.won_at, Some(1_700_000_000));
        assert_eq!(moved.deal.position, 0);
    }

    #[tokio::test]
    async fn test_failed_drop_rolls_back_and_notifies() {
        let mover = FakeMover::new(true);
        let original = board();
        let mut board = OptimisticBoard::new(original.clone());

        let outcome = board
            .on_drag_end(&mover, &drag("d2", ("lead", 1), Some(("won", 1))))
            .await;

        assert_eq!(outcome, DragOutcome::RolledBack);
        assert_eq!(board.board(), &original);
        assert_eq!(mover.calls.lock().unwrap().len(), 1);

        let notifications = board.take_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, MOVE_FAILED);
        assert!(board.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_noop_drops_skip_the_server() {
        let mover = FakeMover::new(false);
        let mut board = OptimisticBoard::new(board());

        let outside = board.on_drag_end(&mover, &drag("d1", ("lead", 0), None)).await;
        let same_slot = board
            .on_drag_end(&mover, &drag("d1", ("lead", 0), Some(("lead", 0))))
            .await;
        let unknown = board
            .on_drag_end(&mover, &drag("missing", ("lead", 0), Some(("won", 0))))
            .await;

        assert_eq!(outside, DragOutcome::Ignored);
        assert_eq!(same_slot, DragOutcome::Ignored);
        assert_eq!(unknown, DragOutcome::Ignored);
        assert!(mover.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_board_renders_before_settling() {
        let mut board = OptimisticBoard::new(board());

        let pending = board
            .begin_move(&drag("d2", ("lead", 1), Some(("lead", 0))))
            .unwrap();
        assert_eq!(board.board().deal_ids("lead"), vec!["d2", "d1"]);
        assert_eq!(pending.request.position, 0);

        let outcome = board.settle(pending, Err(ClientError::Unauthorized));
        assert_eq!(outcome, DragOutcome::RolledBack);
        assert_eq!(board.board().deal_ids("lead"), vec!["d1", "d2"]);
    }
}
