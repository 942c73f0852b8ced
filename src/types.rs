use serde::Serialize;

/// Stable identifier for simulation entities.
///
/// Ids are minted by the session's [`IdSource`] and are unique for the
/// lifetime of a session (they survive `reset`, so a stale id from before a
/// reset can never alias a fresh entity).
pub type EntityId = u64;

/// Monotonic id counter owned by the simulation session.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IdSource {
    next: EntityId,
}

impl IdSource {
    pub fn mint(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}
