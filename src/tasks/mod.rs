//! Background Tasks Module
//!
//! Contains the threads that run alongside the cache.
//!
//! # Tasks
//! - Reaper: removes expired entries as soon as they expire

mod reaper;

pub(crate) use reaper::spawn_reaper;
