//! # FerroDB Storage Core
//!
//! This is the main crate for the **FerroDB** storage engine core.
//!
//! The engine is composed of multiple internal components organized under
//! the `/crates` directory of this workspace:
//!
//! - `/storage/page`: Page identifiers and the fixed page geometry.
//! - `/storage/disk`: Disk managers and the background I/O scheduler.
//! - `/storage/buffer`: The buffer pool manager, LRU-K replacement and the
//!   page guards that mediate all page access.
//! - `/storage/storage-api`: The facade, configuration and logging wiring
//!   handed to upper layers.
