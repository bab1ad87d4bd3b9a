//! Deps cleaners: post-processing of a rule's computed label set.

use indexmap::IndexMap;

use crate::base::Label;
use crate::host::Rule;

mod scala_proto_grpc;

pub use scala_proto_grpc::ScalaProtoGrpcDepsCleaner;

/// Removes labels made redundant by others.
pub trait DepsCleaner: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Set the value of a label to `false` to drop it.
    fn clean_deps(&self, deps: &mut IndexMap<Label, bool>, rule: &Rule, from: &Label);
}
