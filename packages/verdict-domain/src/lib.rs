pub mod confidence;
pub mod explain;
pub mod gate;
pub mod intake;
pub mod record;
pub mod retrieval;
pub mod scoring;

#[cfg(test)]
pub(crate) mod testcfg;
