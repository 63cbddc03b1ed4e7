// Network graph view: graph construction, progressive reveal, force layout,
// zoom/pan transforms, and connection queries.

pub mod builder;
pub mod handlers;
pub mod model;
pub mod path;
pub mod reveal;
pub mod simulation;
pub mod viewport;
