//! Flutter-facing bindings over `studysmart_core`.

pub mod api;
