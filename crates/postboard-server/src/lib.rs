//! postboard-server — server-rendered post board over a cached REST dataset
//!
//! Users, posts and comments come from a DummyJSON-style API once, are kept as a
//! single JSON snapshot on disk, and every page is rendered on the server from
//! the in-memory copy. Local posts, comments and reactions write the whole
//! snapshot back.

pub mod board;
pub mod config;
pub mod error;
pub mod http;
pub mod loader;
pub mod model;
pub mod remote;
pub mod store;
pub mod views;
