mod cancel;
mod policy;
mod ticker;


pub use cancel::Cancellation;
pub use policy::{DelayPolicy, DelaySampler};
pub use ticker::{Tick, Ticker};
