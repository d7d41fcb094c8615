//! Game library model shared by the scraper and the frontend host.

pub mod error;
pub mod game;
pub mod hasher;
pub mod library;
pub mod metadata;
pub mod platform;
pub mod region;
pub mod store;

pub use error::LibraryError;
pub use game::{Collection, Game, GameId, GameRef};
pub use hasher::{RomHashes, compute_rom_hashes};
pub use library::{Library, SystemCollection, scan_library, scan_collection};
pub use metadata::{Metadata, MetadataChanges};
pub use platform::{Platform, PlatformParseError};
pub use region::Region;
