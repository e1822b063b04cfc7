pub mod flow_source;
#[cfg(test)]
pub(crate) mod fake;
