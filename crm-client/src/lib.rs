//! Client side of the CRM: a typed HTTP client for the API and the optimistic
//! controller behind the deal board.

pub mod api;
pub mod board;

pub use api::{ApiClient, ClientError, DealMover};
pub use board::{DragOutcome, Notification, OptimisticBoard, PendingMove};
