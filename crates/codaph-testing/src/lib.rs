//! Internal fixture helpers shared across codaph's crates' test suites.
//! Not published for external use.

pub mod events;
pub mod fake_remote;
pub mod mirror;

pub use events::{agent_message, event_context, prompt_submitted, reasoning, timeline_entry};
pub use fake_remote::{CallLog, FakeRemoteMemory};
pub use mirror::MirrorFixture;
