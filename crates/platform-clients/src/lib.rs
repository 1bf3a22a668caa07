//! Thin clients for the platform's external collaborators: the
//! code-hosting API, the LLM chat provider, the analytics log store,
//! and the pub/sub job broker.
//!
//! Out of scope per spec §1: these are glue, not products. Each module
//! is a small trait plus one real implementation and one in-memory fake
//! for tests.

pub mod broker;
pub mod chat;
pub mod error;
pub mod logs;
pub mod repo_host;

pub use broker::{JobBroker, RedisJobBroker};
pub use chat::{ChatMessage, ChatProvider, ChatRole, FakeChatProvider};
pub use error::{BrokerError, ChatError, LogStoreError, RepoHostError};
pub use logs::{FakeLogStore, HttpLogStore, LogLine, LogStore};
pub use repo_host::{FakeRepoHost, GithubRepoHost, RepoHost};
