use uuid::Uuid;

/// Port for generating record identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a new identifier.
    fn generate(&self) -> String;
}

/// Time-ordered UUIDv7 identifiers, sortable by creation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate(&self) -> String {
        Uuid::now_v7().simple().to_string()
    }
}

/// Prepends a fixed prefix to identifiers from another generator.
pub struct PrefixedIdGenerator<G> {
    prefix: &'static str,
    inner: G,
}

impl<G: IdGenerator> PrefixedIdGenerator<G> {
    /// Wraps `inner` so that every identifier starts with `prefix`.
    #[must_use]
    pub fn new(prefix: &'static str, inner: G) -> Self {
        Self { prefix, inner }
    }
}

impl<G: IdGenerator> IdGenerator for PrefixedIdGenerator<G> {
    fn generate(&self) -> String {
        format!("{}{}", self.prefix, self.inner.generate())
    }
}
