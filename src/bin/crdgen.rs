//! CRD YAML Generator
//!
//! Prints the built-in CustomResourceDefinitions the provider ships with.
//!
//! Usage: cargo run --bin crdgen > deploy/crds/builtin.yaml

use k8s_crd_provider::crd::generate_crds;

fn main() -> anyhow::Result<()> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}
