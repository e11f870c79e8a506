//! Pitchlens - live viewer for streamed pitching analysis
//!
//! Uploads a pitching video to an analysis service, follows the resulting
//! analysis stream, decodes the annotated frames onto a render surface and
//! keeps a metrics panel, a coaching advisory and a short session history
//! up to date.
//!
//! The [`session::SessionMachine`] holds all state and performs no I/O;
//! [`session::run_session`] drives it against a [`transport::Transport`].

pub mod advisory;
pub mod cli;
pub mod config;
pub mod frame;
pub mod history;
pub mod logging;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod transport;
