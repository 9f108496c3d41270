//! hecbuild subcommands

pub(crate) mod build;
pub(crate) mod completion;
pub(crate) mod doctor;
pub(crate) mod env;
pub(crate) mod spec;
