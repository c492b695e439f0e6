//! Progress rendering while answers stream

pub mod reporter;
