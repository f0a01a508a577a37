//! Flutter bridge for the BucketList core.

pub mod api;
