pub mod feed;
pub mod status_change;
pub mod trip;
