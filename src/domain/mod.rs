// Domain layer: panel models and ports (interfaces to the database, the recognizer
// and local schedule persistence).

pub mod model;
pub mod ports;
