//! In-memory implementations of the pipeline seams.
//!
//! They let the producer, the worker and the HTTP layer run end to end
//! without Postgres, Redis, S3 or ffmpeg.
//!
//! ```rust,ignore
//! use streamify::testing::{MemoryQueue, MemoryStorage, MemoryVideoStore, ScriptedTranscoder};
//!
//! let store = Arc::new(MemoryVideoStore::new());
//! let transcoder = Arc::new(ScriptedTranscoder::failing(1, "Invalid data found"));
//! ```

mod memory_queue;
mod memory_storage;
mod memory_store;
mod scripted_transcoder;

pub use memory_queue::MemoryQueue;
pub use memory_storage::MemoryStorage;
pub use memory_store::MemoryVideoStore;
pub use scripted_transcoder::{ScriptedTranscoder, TranscodeScript};
