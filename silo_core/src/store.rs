//! Persistence collaborator boundary.
//!
//! The engine treats durability as "load everything / save everything" and
//! keeps operating in memory when the store misbehaves: load failures fall
//! back to defaults at the call site, save failures are logged by the
//! scheduler and retried on the next flush. In-memory state stays
//! authoritative either way; the store is write-through, never a read path.

use crate::bin::Bin;
use crate::error::Result;
use crate::settings::SystemSettings;

pub trait BinStore {
    fn load_bins(&mut self) -> Result<Vec<Bin>>;
    fn save_bins(&mut self, bins: &[Bin]) -> Result<()>;
    fn load_settings(&mut self) -> Result<SystemSettings>;
    fn save_settings(&mut self, settings: &SystemSettings) -> Result<()>;
}
