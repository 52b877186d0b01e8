//! Value types shared by the `chatkit` conversation core.

pub mod message;
