/// Collaborator traits implemented outside the engine
use crate::error::Result;

/// Volume collaborator
///
/// Implemented by the hardware codec driver on a device, or by a software
/// gain stage on the desktop. Implementations clamp `level` to whatever
/// range the device supports; the controller already keeps it in `0..=max`.
pub trait VolumeControl: Send {
    /// Apply an absolute volume level
    ///
    /// # Errors
    /// Returns an error if the device rejects the change
    fn set_volume(&mut self, level: u8) -> Result<()>;
}
