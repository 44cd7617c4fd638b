//! Test helpers shared by the roicluster crates.
//!
//! [`tracing`] captures spans and events so instrumentation can be asserted;
//! [`ci`] reads the environment overrides CI uses to scale property suites.

pub mod ci;
pub mod tracing;
