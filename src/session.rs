//! Communication with the rendering layer
//!
//! The game engine never draws anything itself. After every transition it
//! pushes a snapshot through a [`Tunnel`], which a front end implements on
//! top of whatever it renders with.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages to the front end
pub trait Tunnel {
    /// Sends an update message to the front end
    ///
    /// Update messages report requests that were rejected, such as a match
    /// start with an invalid team name.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a state synchronization message to the front end
    ///
    /// Sync messages carry the complete game state and are sent after
    /// every transition.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);
}

impl<T: Tunnel + ?Sized> Tunnel for &T {
    fn send_message(&self, message: &UpdateMessage) {
        (**self).send_message(message);
    }

    fn send_state(&self, state: &SyncMessage) {
        (**self).send_state(state);
    }
}
