pub mod carbon;
pub mod elexon;
pub mod fetcher;
pub mod normalize;
pub mod reconcile;
pub mod snapshot;
