//! primerwatch-client: talking to the managed backend and the taxonomy service.
//! - RPC + auth client (`RpcClient`)
//! - NCBI taxonomy lookup (`TaxonomyClient`)
//! - Bounded fan-out for multi-select actions
//! - FASTA bulk import
//! - Dashboard selection, job submission and status poller
//! - BLAST planning and CSV export

pub mod batch;
pub mod blast;
pub mod dashboard;
pub mod export;
pub mod import;
pub mod rpc;
pub mod taxonomy;
pub mod validate;

pub use batch::{run_batch, BatchFailure, BatchReport};
pub use dashboard::{DashboardPoller, DashboardSelection, DashboardSnapshot, PollerHandle};
pub use rpc::RpcClient;
pub use taxonomy::{TaxonomyClient, TaxonomyError, TaxonomyRecord};
