pub mod commit;
pub mod store;

pub use commit::{commit_hash, generate_secret, reveal_payload, CommitHash};
pub use store::{
    FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, SecretStore, SecretStoreError,
    DEFAULT_SECRET_NAMESPACE,
};
