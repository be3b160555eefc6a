//! Dataset model: manifest, per-object table, frame cache, tracks and collections.

pub mod collection;
pub mod dataset;
pub mod frame_cache;
pub mod manifest;
pub mod object_table;
pub mod track;
