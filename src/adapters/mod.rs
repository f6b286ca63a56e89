pub mod memory;
pub mod ports;
pub mod postgres;
pub mod push;
pub mod warehouse;

pub use memory::{InMemoryFactSource, InMemoryStore, RecordingDispatcher};
pub use ports::{AwardStore, InsertOutcome, MatchFactSource, NotificationDispatcher, NotificationLedger, PlayerDirectory};
pub use postgres::PostgresStore;
pub use push::{LogDispatcher, PushDispatcher};
pub use warehouse::WarehouseStore;
