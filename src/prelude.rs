//! The traits most handlers need: `use routekit::prelude::*;`.

pub use crate::controller::Controller;
pub use crate::ext::RequestExt;
