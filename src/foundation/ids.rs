/// Material id generator owned by a single builder or session.
///
/// Each generator counts independently, so two scenes built side by side never collide and a
/// rebuilt scene gets the same ids every time.
#[derive(Clone, Debug)]
pub struct MaterialIdGen {
    prefix: String,
    next: u64,
}

impl MaterialIdGen {
    /// Default prefix used by [`MaterialIdGen::default`].
    pub const DEFAULT_PREFIX: &'static str = "m";

    /// Create a generator producing `{prefix}1`, `{prefix}2`, ...
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Allocate the next id.
    pub fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for MaterialIdGen {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/ids.rs"]
mod tests;
