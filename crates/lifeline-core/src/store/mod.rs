// ── Reactive store ──

mod board_store;
mod collection;
mod refresh;

pub use board_store::BoardStore;
pub use collection::Keyed;
