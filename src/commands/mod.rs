//! CLI command implementations for fgalign.
//!
//! Each submodule implements one subcommand; [`common`] holds the option
//! structs shared between them and [`command`] the dispatch trait.

// Blanket clippy pedantic allows for command implementations.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod align;
pub mod command;
pub mod common;
