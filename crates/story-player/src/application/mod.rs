//! Player orchestration: messaging, load sequencing, frame lifecycle,
//! reconciliation and the public surface.

pub mod animation;
pub mod inbound;
pub mod lifecycle;
pub mod load;
pub mod messaging;
pub mod navigation;
pub mod player;
pub mod render;
