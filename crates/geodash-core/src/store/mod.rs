// ── Reactive layer store ──
//
// Per-layer state in a `DashMap`, ordered snapshots broadcast on a
// `watch` channel.

mod stream;
mod table;

pub use stream::{LayerStream, LayerWatchStream};
pub use table::LayerTable;
