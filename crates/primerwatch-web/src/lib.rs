//! primerwatch-web: browser front end for primer/probe surveillance.
//! Provides:
//!   - Sign-in against the hosted backend (session cookie)
//!   - Assay, oligo and TaxID management with bulk actions
//!   - Surveillance dashboard with live status over SSE
//!   - BLAST job planning, results and CSV export
//!   - NCBI taxonomy lookup proxy

pub mod auth;
pub mod router;
pub mod handlers;
pub mod state;
pub mod sse;
