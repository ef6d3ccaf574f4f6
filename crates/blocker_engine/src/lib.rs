//! Blocker engine: the feed surface, detection, tree interactions, the settings
//! collaborator and the pipeline that executes core effects.
mod actions;
mod detect;
mod dom;
mod locate;
mod messages;
mod persist;
mod pipeline;
mod profile;
mod rehearsal;
mod snapshot;
mod store;
mod surface;
mod sync;
mod timers;

pub use actions::{confirm_block, open_menu, select_block_option};
pub use detect::{
    closed_confirmations, extract_record, open_confirmation, scan_changes, scan_document,
};
pub use dom::HtmlSurface;
pub use locate::{Locator, LocatorChain};
pub use messages::{Background, BlockAck, ChannelError, Request, Response, SettingsChannel};
pub use persist::{ensure_dir, write_atomic, PersistError};
pub use pipeline::{Pipeline, PipelineEvent};
pub use profile::{CompiledProfile, ProfileError, SurfaceProfile};
pub use rehearsal::RehearsalSurface;
pub use snapshot::{decode_snapshot, load_snapshot, Snapshot, SnapshotError};
pub use store::{MemoryStore, RonFileStore, SettingsStore, StoreError, StoredSettings};
pub use surface::{Mutation, Surface, SurfaceError};
pub use sync::{settings_from_stored, SettingsSync, DEFAULT_SYNC_INTERVAL};
pub use timers::TimerQueue;
