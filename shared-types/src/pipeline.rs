//! In-memory pipeline board: stage columns holding ordered deal cards.
//!
//! The board is what the kanban view renders. [`PipelineBoard::apply_drag`] performs the
//! optimistic part of a drag and drop and hands back the single move request that the
//! server needs to persist it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::deal::{DealPositionUpdate, DealStage, DealWithDetails, MoveDealRequest};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Deal {0} is not on the board")]
    UnknownDeal(String),

    #[error("Stage {0} is not on the board")]
    UnknownStage(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BoardColumn {
    pub stage: DealStage,
    pub deals: Vec<DealWithDetails>,
}

impl BoardColumn {
    pub fn total_value(&self) -> f64 {
        self.deals.iter().filter_map(|d| d.deal.value).sum()
    }

    fn renumber(&mut self) {
        for (index, card) in self.deals.iter_mut().enumerate() {
            card.deal.position = index as i64;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PipelineBoard {
    pub columns: Vec<BoardColumn>,
}

/// Where a card was picked up or dropped: a stage column and an index within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DragLocation {
    pub stage_id: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DragResult {
    pub deal_id: String,
    pub source: DragLocation,
    /// `None` when the card was dropped outside any column.
    pub destination: Option<DragLocation>,
}

impl PipelineBoard {
    /// Groups deals under their stages. Columns follow the stage display order and
    /// cards follow their stored position; deals of unknown stages are dropped.
    pub fn from_parts(mut stages: Vec<DealStage>, mut deals: Vec<DealWithDetails>) -> Self {
        stages.sort_by_key(|s| s.display_order);
        deals.sort_by_key(|d| d.deal.position);

        let mut columns: Vec<BoardColumn> = stages
            .into_iter()
            .map(|stage| BoardColumn {
                stage,
                deals: Vec::new(),
            })
            .collect();

        for card in deals {
            if let Some(column) = columns
                .iter_mut()
                .find(|c| c.stage.id == card.deal.stage_id)
            {
                column.deals.push(card);
            }
        }

        Self { columns }
    }

    pub fn column(&self, stage_id: &str) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.stage.id == stage_id)
    }

    fn column_index(&self, stage_id: &str) -> Result<usize, BoardError> {
        self.columns
            .iter()
            .position(|c| c.stage.id == stage_id)
            .ok_or_else(|| BoardError::UnknownStage(stage_id.to_string()))
    }

    /// Ids of the cards in a column, top to bottom.
    pub fn deal_ids(&self, stage_id: &str) -> Vec<&str> {
        self.column(stage_id)
            .map(|c| c.deals.iter().map(|d| d.deal.id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Moves the dragged card and renumbers the source and destination columns.
    ///
    /// Returns `Ok(None)` when the drop changes nothing: no destination, or the same
    /// column and index the card started from.
    pub fn apply_drag(&mut self, drag: &DragResult) -> Result<Option<MoveDealRequest>, BoardError> {
        let Some(destination) = drag.destination.as_ref() else {
            return Ok(None);
        };
        if destination.stage_id == drag.source.stage_id && destination.index == drag.source.index {
            return Ok(None);
        }

        let to = self.column_index(&destination.stage_id)?;
        let (from, at) = self
            .locate(&drag.deal_id)
            .ok_or_else(|| BoardError::UnknownDeal(drag.deal_id.clone()))?;

        let mut card = self.columns[from].deals.remove(at);
        let index = destination.index.min(self.columns[to].deals.len());
        card.deal.stage_id = self.columns[to].stage.id.clone();
        card.stage = self.columns[to].stage.clone();
        self.columns[to].deals.insert(index, card);

        self.columns[from].renumber();
        if from != to {
            self.columns[to].renumber();
        }

        Ok(Some(MoveDealRequest {
            deal_id: drag.deal_id.clone(),
            stage_id: destination.stage_id.clone(),
            position: index as i64,
        }))
    }

    /// Every card's stage and position, for a batch reorder.
    pub fn position_updates(&self) -> Vec<DealPositionUpdate> {
        self.columns
            .iter()
            .flat_map(|column| {
                column.deals.iter().map(|card| DealPositionUpdate {
                    id: card.deal.id.clone(),
                    stage_id: column.stage.id.clone(),
                    position: card.deal.position,
                })
            })
            .collect()
    }

    fn locate(&self, deal_id: &str) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(c, column)| {
            column
                .deals
                .iter()
                .position(|card| card.deal.id == deal_id)
                .map(|i| (c, i))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::Deal;

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

    fn card(id: &str, stage: &DealStage, position: i64, value: f64) -> DealWithDetails {
        DealWithDetails {
            deal: Deal {
                id: id.to_string(),
                user_id: "user".to_string(),
                title: format!("Deal {}", id),
                value: Some(value),
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
        let a = stage("a", 0);
        let b = stage("b", 1);
        let deals = vec![
            card("d2", &a, 1, 200.0),
            card("d1", &a, 0, 100.0),
            card("d3", &a, 2, 300.0),
            card("d4", &b, 0, 400.0),
        ];
        PipelineBoard::from_parts(vec![b.clone(), a.clone()], deals)
    }

    fn drag(deal: &str, from: (&str, usize), to: Option<(&str, usize)>) -> DragResult {
        DragResult {
            deal_id: deal.to_string(),
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

    fn positions(board: &PipelineBoard, stage_id: &str) -> Vec<i64> {
        board
            .column(stage_id)
            .unwrap()
            .deals
            .iter()
            .map(|d| d.deal.position)
            .collect()
    }

    #[test]
    fn test_from_parts_orders_columns_and_cards() {
        let board = board();
        assert_eq!(board.columns[0].stage.id, "a");
        assert_eq!(board.deal_ids("a"), vec!["d1", "d2", "d3"]);
        assert_eq!(board.column("a").unwrap().total_value(), 600.0);
    }

    #[test]
    fn test_drop_outside_is_ignored() {
        let mut board = board();
        let before = board.clone();
        assert_eq!(board.apply_drag(&drag("d1", ("a", 0), None)), Ok(None));
        assert_eq!(board, before);
    }

    #[test]
    fn test_drop_in_place_is_ignored() {
        let mut board = board();
        let before = board.clone();
        assert_eq!(board.apply_drag(&drag("d2", ("a", 1), Some(("a", 1)))), Ok(None));
        assert_eq!(board, before);
    }

    #[test]
    fn test_move_across_columns() {
        let mut board = board();
        let request = board
            .apply_drag(&drag("d1", ("a", 0), Some(("b", 0))))
            .unwrap()
            .unwrap();

        assert_eq!(
            request,
            MoveDealRequest {
                deal_id: "d1".to_string(),
                stage_id: "b".to_string(),
                position: 0,
            }
        );
        assert_eq!(board.deal_ids("a"), vec!["d2", "d3"]);
        assert_eq!(board.deal_ids("b"), vec!["d1", "d4"]);
        assert_eq!(positions(&board, "a"), vec![0, 1]);
        assert_eq!(positions(&board, "b"), vec![0, 1]);

        let moved = &board.column("b").unwrap().deals[0];
        assert_eq!(moved.deal.stage_id, "b");
        assert_eq!(moved.stage.id, "b");
    }

    #[test]
    fn test_reorder_within_column() {
        let mut board = board();
        let request = board
            .apply_drag(&drag("d1", ("a", 0), Some(("a", 2))))
            .unwrap()
            .unwrap();
        assert_eq!(request.position, 2);
        assert_eq!(board.deal_ids("a"), vec!["d2", "d3", "d1"]);
        assert_eq!(positions(&board, "a"), vec![0, 1, 2]);
    }

    #[test]
    fn test_index_past_end_is_clamped() {
        let mut board = board();
        let request = board
            .apply_drag(&drag("d3", ("a", 2), Some(("b", 9))))
            .unwrap()
            .unwrap();
        assert_eq!(request.position, 1);
        assert_eq!(board.deal_ids("b"), vec!["d4", "d3"]);
    }

    #[test]
    fn test_unknown_ids() {
        let mut board = board();
        assert_eq!(
            board.apply_drag(&drag("nope", ("a", 0), Some(("b", 0)))),
            Err(BoardError::UnknownDeal("nope".to_string()))
        );
        assert_eq!(
            board.apply_drag(&drag("d1", ("a", 0), Some(("zzz", 0)))),
            Err(BoardError::UnknownStage("zzz".to_string()))
        );
    }

    #[test]
    fn test_position_updates_cover_every_card() {
        let mut board = board();
        board
            .apply_drag(&drag("d4", ("b", 0), Some(("a", 1))))
            .unwrap();
        let updates = board.position_updates();
        assert_eq!(updates.len(), 4);
        assert!(updates.contains(&DealPositionUpdate {
            id: "d4".to_string(),
            stage_id: "a".to_string(),
            position: 1,
        }));
    }
}
