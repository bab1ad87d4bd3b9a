use indexmap::IndexMap;
use tracing::debug;

use super::DepsCleaner;
use crate::base::Label;
use crate::conflict::{GRPC_LIBRARY_SUFFIX, PROTO_LIBRARY_SUFFIX};
use crate::host::Rule;

/// Drops `X_proto_scala_library` when `X_grpc_scala_library` from the
/// same package is also a dependency; the grpc rule exports the proto one.
#[derive(Default)]
pub struct ScalaProtoGrpcDepsCleaner;

impl DepsCleaner for ScalaProtoGrpcDepsCleaner {
    fn name(&self) -> &str {
        "scala_proto_grpc"
    }

    fn clean_deps(&self, deps: &mut IndexMap<Label, bool>, _rule: &Rule, from: &Label) {
        let redundant: Vec<Label> = deps
            .iter()
            .filter(|(_, keep)| **keep)
            .filter_map(|(label, _)| {
                let stem = label.name().strip_suffix(PROTO_LIBRARY_SUFFIX)?;
                let grpc = label.with_name(format!("{stem}{GRPC_LIBRARY_SUFFIX}"));
                deps.get(&grpc).copied().unwrap_or(false).then(|| label.clone())
            })
            .collect();
        for label in redundant {
            debug!(%from, dep = %label, "dropping proto dep implied by grpc dep");
            deps.insert(label, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(labels: &[&str]) -> IndexMap<Label, bool> {
        labels.iter().map(|l| (Label::parse(l).unwrap(), true)).collect()
    }

    #[test]
    fn test_proto_dropped_when_grpc_present() {
        let mut set = deps(&[
            "//proto/api:api_proto_scala_library",
            "//proto/api:api_grpc_scala_library",
            "//proto/other:other_proto_scala_library",
        ]);
        let rule = Rule::new("scala_library", "app");
        ScalaProtoGrpcDepsCleaner.clean_deps(&mut set, &rule, &Label::parse("//app:app").unwrap());

        let kept: Vec<String> = set.iter().filter(|(_, k)| **k).map(|(l, _)| l.to_string()).collect();
        assert_eq!(
            kept,
            vec!["//proto/api:api_grpc_scala_library", "//proto/other:other_proto_scala_library"]
        );
    }
}
