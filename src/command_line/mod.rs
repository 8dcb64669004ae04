pub(crate) mod archive;
pub(crate) mod cli;
pub(crate) mod report;
pub(crate) mod runner;
