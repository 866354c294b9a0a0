pub mod keyboard;
pub mod outbound;
pub mod update;
