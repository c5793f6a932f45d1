//! Optimistic favorite toggling with one request in flight per title.

use std::collections::HashSet;

/// Proof that a toggle was started; hand it back to [`FavoriteSet::settle`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket must be settled or the title stays locked"]
pub struct Ticket {
    media_id: u32,
    /// Membership after the optimistic flip.
    now_favorite: bool,
}

impl Ticket {
    pub fn media_id(&self) -> u32 {
        self.media_id
    }

    pub fn now_favorite(&self) -> bool {
        self.now_favorite
    }
}

#[derive(Debug, Clone, Default)]
pub struct FavoriteSet {
    ids: HashSet<u32>,
    in_flight: HashSet<u32>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, media_id: u32) -> bool {
        self.ids.contains(&media_id)
    }

    pub fn is_pending(&self, media_id: u32) -> bool {
        self.in_flight.contains(&media_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Start a toggle. Returns `None` while another toggle for the same
    /// title has not settled.
    pub fn begin(&mut self, media_id: u32) -> Option<Ticket> {
        if !self.in_flight.insert(media_id) {
            return None;
        }
        let now_favorite = if self.ids.remove(&media_id) {
            false
        } else {
            self.ids.insert(media_id);
            true
        };
        Some(Ticket {
            media_id,
            now_favorite,
        })
    }

    /// Finish a toggle. A failed toggle undoes the optimistic flip.
    pub fn settle(&mut self, ticket: Ticket, ok: bool) {
        self.in_flight.remove(&ticket.media_id);
        if ok {
            return;
        }
        if ticket.now_favorite {
            self.ids.remove(&ticket.media_id);
        } else {
            self.ids.insert(ticket.media_id);
        }
    }

    /// Record what the server reported for one title. Ignored while a
    /// toggle for it is in flight.
    pub fn mark(&mut self, media_id: u32, favorite: bool) {
        if self.in_flight.contains(&media_id) {
            return;
        }
        if favorite {
            self.ids.insert(media_id);
        } else {
            self.ids.remove(&media_id);
        }
    }

    /// Reload from the server's list. Titles with a toggle in flight keep
    /// their optimistic state.
    pub fn replace_all(&mut self, ids: impl IntoIterator<Item = u32>) {
        let mut fresh: HashSet<u32> = ids.into_iter().collect();
        for id in &self.in_flight {
            if self.ids.contains(id) {
                fresh.insert(*id);
            } else {
                fresh.remove(id);
            }
        }
        self.ids = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_flips_optimistically() {
        let mut favs = FavoriteSet::new();
        let ticket = favs.begin(7).unwrap();
        assert!(ticket.now_favorite());
        assert!(favs.contains(7));
        assert!(favs.is_pending(7));

        favs.settle(ticket, true);
        assert!(favs.contains(7));
        assert!(!favs.is_pending(7));
    }

    #[test]
    fn test_second_begin_while_in_flight() {
        let mut favs = FavoriteSet::new();
        let ticket = favs.begin(7).unwrap();
        assert_eq!(favs.begin(7), None);
        // Other titles are independent.
        let other = favs.begin(8).unwrap();

        favs.settle(ticket, true);
        favs.settle(other, true);
        let again = favs.begin(7).unwrap();
        assert!(!again.now_favorite());
        favs.settle(again, true);
        assert!(!favs.contains(7));
    }

    #[test]
    fn test_failed_toggle_reverts() {
        let mut favs = FavoriteSet::new();
        favs.replace_all([3]);

        let ticket = favs.begin(3).unwrap();
        assert!(!favs.contains(3));
        favs.settle(ticket, false);
        assert!(favs.contains(3));

        let ticket = favs.begin(4).unwrap();
        favs.settle(ticket, false);
        assert!(!favs.contains(4));
    }

    #[test]
    fn test_mark_skips_in_flight() {
        let mut favs = FavoriteSet::new();
        favs.mark(1, true);
        assert!(favs.contains(1));

        let ticket = favs.begin(1).unwrap();
        favs.mark(1, true);
        assert!(!favs.contains(1));
        favs.settle(ticket, true);

        favs.mark(1, true);
        assert!(favs.contains(1));
    }

    #[test]
    fn test_replace_all_keeps_in_flight_state() {
        let mut favs = FavoriteSet::new();
        favs.replace_all([1, 2]);

        let adding = favs.begin(5).unwrap();
        let removing = favs.begin(2).unwrap();

        // Server list predates both toggles.
        favs.replace_all([1, 2, 9]);
        assert!(favs.contains(1));
        assert!(favs.contains(9));
        assert!(favs.contains(5));
        assert!(!favs.contains(2));
        assert_eq!(favs.len(), 3);

        favs.settle(adding, true);
        favs.settle(removing, true);
    }
}
