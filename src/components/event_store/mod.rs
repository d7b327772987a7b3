//! Redis-backed calendar store the importer writes into.
//!
//! Records live under `wordcamp_importer:event:{local_id}` as JSON; the
//! remote-to-local ID links are a single hash so the importer can load every
//! known WordCamp ID in one round trip.

mod actor;

pub use actor::{keys, EventStoreActor, EventStoreHandle};
