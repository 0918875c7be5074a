use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Exclusion sentinel for [`Roster::broadcast`]: send to everyone.
pub const NO_EXCLUDE: u8 = 0xff;

/// What a connection task writes to its socket on behalf of other tasks.
pub enum Outbound {
    Data(Vec<u8>),
    /// Payload to write before closing the connection (used by /kick).
    Kick(Vec<u8>),
}

/// One connected client. Positions are fixed-point pixels.
pub struct Session {
    pub username: String,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub yaw: u8,
    pub pitch: u8,
    /// Set once the spawn-init sequence has completed. Unspawned sessions
    /// are skipped by broadcasts and the spawn list.
    pub spawned: bool,
    outbound: UnboundedSender<Outbound>,
}

impl Session {
    pub fn send(&self, message: Outbound) {
        // a closed receiver just means the task is already shutting down
        let _ = self.outbound.send(message);
    }
}

/// Fixed-capacity slot table; `None` marks a free slot. The slot index
/// doubles as the wire-level player ID, so it stays stable while the
/// session lives and may be reused afterwards.
pub struct Roster {
    slots: Vec<Option<Session>>,
}

impl Roster {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Claims the first free slot, returning its index and the receiving
    /// end of the session's outbound queue. `None` when the server is
    /// full.
    pub fn claim(&mut self) -> Option<(u8, UnboundedReceiver<Outbound>)> {
        let free = self.slots.iter().position(|slot| slot.is_none())?;
        let (sender, receiver) = mpsc::unbounded_channel();

        self.slots[free] = Some(Session {
            username: String::new(),
            x: 0,
            y: 0,
            z: 0,
            yaw: 0,
            pitch: 0,
            spawned: false,
            outbound: sender,
        });

        Some((free as u8, receiver))
    }

    pub fn release(&mut self, slot: u8) {
        if let Some(entry) = self.slots.get_mut(slot as usize) {
            *entry = None;
        }
    }

    pub fn get(&self, slot: u8) -> Option<&Session> {
        self.slots.get(slot as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: u8) -> Option<&mut Session> {
        self.slots.get_mut(slot as usize)?.as_mut()
    }

    pub fn find_by_username(&self, username: &str) -> Option<u8> {
        self.spawned()
            .find(|(_, session)| session.username == username)
            .map(|(slot, _)| slot)
    }

    /// Spawned sessions in slot order.
    pub fn spawned(&self) -> impl Iterator<Item = (u8, &Session)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry
                .as_ref()
                .filter(|session| session.spawned)
                .map(|session| (slot as u8, session))
        })
    }

    /// Queues `payload` on every spawned session in slot order, except
    /// `exclude` ([`NO_EXCLUDE`] sends to everyone).
    pub fn broadcast(&self, exclude: u8, payload: &[u8]) {
        for (slot, session) in self.spawned() {
            if exclude != NO_EXCLUDE && slot == exclude {
                continue;
            }
            session.send(Outbound::Data(payload.to_vec()));
        }
    }
}
