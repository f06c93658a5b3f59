use super::*;
use std::fs;

fn touch(root: &Path, path: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().expect("path must have a parent")).expect("create dirs");
    fs::write(path, "").expect("write file");
}

#[test]
fn nothing_supported() {
    let root = tempfile::tempdir().expect("tempdir");
    assert_eq!(capabilities_at(root.path()), Capabilities::default());
}

#[test]
fn iptables_supported() {
    let root = tempfile::tempdir().expect("tempdir");
    touch(root.path(), ROUTE_LOCALNET);
    assert_eq!(
        capabilities_at(root.path()),
        Capabilities {
            iptables: true,
            ipvs: false,
        }
    );
}

#[test]
fn ipvs_and_iptables_supported() {
    let root = tempfile::tempdir().expect("tempdir");
    touch(root.path(), ROUTE_LOCALNET);
    touch(root.path(), IPVS_PROC);
    assert_eq!(
        capabilities_at(root.path()),
        Capabilities {
            iptables: true,
            ipvs: true,
        }
    );
}
