// Derived dashboard views: time series, grouping, calendar timeline, map,
// and narrative chapters. All are pure functions of the record set.

pub mod grouping;
pub mod handlers;
pub mod map;
pub mod narrative;
pub mod timeline;
pub mod timeseries;
