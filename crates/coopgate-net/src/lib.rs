//! Coopgate Net - configuration client, reachability probe, attribution
//! sources, push ingestion, and the surface preview fetcher

pub mod attribution;
pub mod connectivity;
pub mod preview;
pub mod push;
pub mod setup;

pub use attribution::{AttributionSource, FileAttribution, StaticAttribution};
pub use connectivity::{ConnectivityMonitor, LinkState};
pub use preview::{PreviewError, PreviewPage, SurfacePreview};
pub use setup::{
    locale_region, HttpSetupClient, QueryContext, SetupDecision, SetupError, SetupQuery,
    SetupService,
};
