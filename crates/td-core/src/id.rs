use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for drawing IDs: fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A stable identifier for a drawing on a chart.
/// Internally a `Spur` index (4 bytes, Copy, Eq, Hash in O(1)).
///
/// The string form is what gets persisted and what the server echoes back
/// in update/delete messages, so it must survive a full round-trip.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawingId(Spur);

impl DrawingId {
    /// Intern a string as a DrawingId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        DrawingId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh id for a newly drawn annotation (`drawing-<n>`).
    ///
    /// Interned strings are never freed, so every call grows the process
    /// interner by one entry, including previews that are cancelled and
    /// never committed. Fine for hand-drawn volumes; don't call this in a
    /// loop over bulk data.
    pub fn generate() -> Self {
        Self::with_prefix("drawing")
    }

    /// Generate a unique ID with a prefix (e.g. `drawing-1`, `preview-2`).
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}-{n}");
            // Hydrated drawings may already use a generated-looking name.
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DrawingId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DrawingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DrawingId::intern(&s))
    }
}
