use serde::Serialize;
use serde::de::DeserializeOwned;

/// Contract between the table and the values stored in it.
///
/// Records are copied verbatim between participants, so they must be
/// self-contained values (no references into one participant's memory).
/// `hash_key` has to return the same value on every participant for equal
/// keys; it decides where a key's probe sequence starts.
pub trait TableRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Key: Eq + Send + Sync + 'static;

    fn key(&self) -> &Self::Key;

    fn hash_key(key: &Self::Key) -> u64;
}
