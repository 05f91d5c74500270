//! Session-scoped slots on top of the key-value store.

use std::marker::PhantomData;
use std::time::Duration;

use crate::{Cache, CacheError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Envelope stored for a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData<T> {
    /// Owning session.
    pub session_id: SessionId,
    /// User-defined payload.
    pub data: T,
    /// Incremented on every overwrite.
    pub version: u64,
    /// When the slot was first written (Unix millis).
    pub created_at: i64,
    /// When the slot was last written (Unix millis).
    pub updated_at: i64,
}

/// A named, typed, single-value slot belonging to one session.
///
/// The slot does not own storage; it addresses a key inside a [`Cache`] so
/// several slots (and plain keys) can share one store.
///
/// # Example
///
/// ```rust
/// use shopfront_cache::{Cache, SessionId, SessionSlot};
///
/// let mut cache = Cache::new();
/// let slot: SessionSlot<String> = SessionSlot::new(SessionId::new("sess_1"), "note");
///
/// slot.store(&mut cache, &"remember me".to_string()).unwrap();
/// assert_eq!(slot.load(&cache).unwrap().as_deref(), Some("remember me"));
///
/// assert!(slot.clear(&mut cache));
/// assert!(slot.load(&cache).unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SessionSlot<T> {
    session_id: SessionId,
    name: String,
    ttl: Option<Duration>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> SessionSlot<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Create a slot with no expiry.
    pub fn new(session_id: SessionId, name: impl Into<String>) -> Self {
        Self {
            session_id,
            name: name.into(),
            ttl: None,
            _phantom: PhantomData,
        }
    }

    /// Expire the slot `ttl` after each write.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The session this slot belongs to.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Key used inside the cache.
    pub fn key(&self) -> String {
        crate::cache_key!("session", self.session_id, self.name)
    }

    /// Load the payload if present and not expired.
    pub fn load(&self, cache: &Cache) -> Result<Option<T>, CacheError> {
        Ok(self.load_versioned(cache)?.map(|envelope| envelope.data))
    }

    /// Load the full envelope including version.
    pub fn load_versioned(&self, cache: &Cache) -> Result<Option<SessionData<T>>, CacheError> {
        cache.get::<SessionData<T>>(&self.key())
    }

    /// Write the payload, returning the new version.
    pub fn store(&self, cache: &mut Cache, data: &T) -> Result<u64, CacheError> {
        let key = self.key();
        let now = now_millis();
        let envelope = match cache.get::<SessionData<T>>(&key)? {
            Some(previous) => SessionData {
                session_id: self.session_id.clone(),
                data: data.clone(),
                version: previous.version + 1,
                created_at: previous.created_at,
                updated_at: now,
            },
            None => SessionData {
                session_id: self.session_id.clone(),
                data: data.clone(),
                version: 1,
                created_at: now,
                updated_at: now,
            },
        };
        cache.set_with_ttl(&key, &envelope, self.ttl)?;
        Ok(envelope.version)
    }

    /// Read-modify-write the payload. A missing slot is reported as `NotFound`.
    pub fn update<F>(&self, cache: &mut Cache, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&mut T),
    {
        let mut data = self
            .load(cache)?
            .ok_or_else(|| CacheError::NotFound(self.key()))?;
        f(&mut data);
        self.store(cache, &data)?;
        Ok(data)
    }

    /// Remove the payload and return it.
    pub fn take(&self, cache: &mut Cache) -> Result<Option<T>, CacheError> {
        let data = self.load(cache)?;
        cache.delete(&self.key());
        Ok(data)
    }

    /// Remove the payload. Returns whether a live value was removed.
    pub fn clear(&self, cache: &mut Cache) -> bool {
        cache.delete(&self.key())
    }

    /// Check if the slot holds a live value.
    pub fn exists(&self, cache: &Cache) -> bool {
        cache.exists(&self.key())
    }
}

/// Current time as Unix milliseconds. Returns `0` if the clock is before the epoch.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> SessionSlot<Vec<String>> {
        SessionSlot::new(SessionId::new("sess_test"), "items")
    }

    #[test]
    fn test_now_millis_is_wall_clock() {
        let before = now_millis();
        assert!(before > 1_600_000_000_000);
        assert!(now_millis() >= before);
    }

    #[test]
    fn test_session_id_generate_format() {
        let id = SessionId::generate();
        let s = id.as_str();

        assert!(s.starts_with("sess_"));
        // 18 bytes encode to 24 base64 chars
        assert_eq!(s.len(), 29);
    }

    #[test]
    fn test_session_id_generate_uniqueness() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_session_id_serialization() {
        let id = SessionId::new("serialize-me");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""serialize-me""#);
    }

    #[test]
    fn test_slot_key_is_namespaced() {
        assert_eq!(slot().key(), "session:sess_test:items");
    }

    #[test]
    fn test_store_bumps_version() {
        let mut cache = Cache::new();
        let slot = slot();

        assert_eq!(slot.store(&mut cache, &vec!["a".to_string()]).unwrap(), 1);
        assert_eq!(slot.store(&mut cache, &vec!["b".to_string()]).unwrap(), 2);

        let envelope = slot.load_versioned(&cache).unwrap().unwrap();
        assert_eq!(envelope.version, 2);
        assert_eq!(envelope.data, vec!["b".to_string()]);
    }

    #[test]
    fn test_update_requires_existing_value() {
        let mut cache = Cache::new();
        let slot = slot();

        assert!(matches!(
            slot.update(&mut cache, |items| items.push("x".to_string())),
            Err(CacheError::NotFound(_))
        ));

        slot.store(&mut cache, &Vec::new()).unwrap();
        let updated = slot
            .update(&mut cache, |items| items.push("x".to_string()))
            .unwrap();
        assert_eq!(updated, vec!["x".to_string()]);
    }

    #[test]
    fn test_take_removes_value() {
        let mut cache = Cache::new();
        let slot = slot();
        slot.store(&mut cache, &vec!["a".to_string()]).unwrap();

        assert_eq!(slot.take(&mut cache).unwrap(), Some(vec!["a".to_string()]));
        assert!(!slot.exists(&cache));
        assert_eq!(slot.take(&mut cache).unwrap(), None);
    }

    #[test]
    fn test_slots_are_scoped_per_session() {
        let mut cache = Cache::new();
        let mine: SessionSlot<u32> = SessionSlot::new(SessionId::new("a"), "ticket");
        let theirs: SessionSlot<u32> = SessionSlot::new(SessionId::new("b"), "ticket");

        mine.store(&mut cache, &7).unwrap();
        assert_eq!(mine.load(&cache).unwrap(), Some(7));
        assert_eq!(theirs.load(&cache).unwrap(), None);
    }

    #[test]
    fn test_expired_slot_reads_as_empty() {
        let mut cache = Cache::new();
        let slot: SessionSlot<u32> =
            SessionSlot::new(SessionId::new("a"), "ticket").with_ttl(Duration::ZERO);
        slot.store(&mut cache, &1).unwrap();
        assert_eq!(slot.load(&cache).unwrap(), None);
    }
}
