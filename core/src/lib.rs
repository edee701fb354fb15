pub mod boolean;
pub mod index;
pub mod normalize;
pub mod persist;
pub mod ranker;
pub mod stats;
pub mod store;

/// Stable document identifier derived from the numeric page index,
/// e.g. `page-17`.
pub type DocId = String;
