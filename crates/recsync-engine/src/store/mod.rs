//! Cursor store implementations.

mod memory;
mod postgres;

pub use memory::MemoryCursorStore;
pub use postgres::PgCursorStore;
