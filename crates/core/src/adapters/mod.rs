//! Adapters bundled with the core: in-memory storage, a sequential id generator, a fake
//! payment gateway and a fake video-conference provider. The REST server and the CLI wire
//! these by default.

mod gateway;
mod memory;
mod video;

pub use gateway::FakePaymentGateway;
pub use memory::{InMemoryStore, SequentialIdGenerator};
pub use video::FakeVideoConferenceProvider;
