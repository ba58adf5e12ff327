//! Prints the marketplace CRDs as multi-document YAML.
//!
//! `cargo run -p crds --bin crdgen > deploy/crds.yaml`

use crds::{CatalogSourceConfig, OperatorSource};
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    let documents = [
        serde_yaml::to_string(&OperatorSource::crd())?,
        serde_yaml::to_string(&CatalogSourceConfig::crd())?,
    ];
    for doc in documents {
        println!("---");
        print!("{doc}");
    }
    Ok(())
}
